pub mod complexity;
pub mod sentiment;

pub use complexity::ComplexityAnalyzer;
pub use sentiment::{ Intensity, Sentiment, SentimentAnalyzer, SentimentResult };
