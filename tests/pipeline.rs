use std::collections::HashSet;
use std::sync::Arc;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use catgpt::agent::CatAgent;
use catgpt::cli::Args;
use catgpt::config::complexity::ComplexityConfig;
use catgpt::generation::tone::{ pool_for, ToneContext };
use catgpt::generation::{ ReplyPlan, ReplyPlanner };

const DAY_HOUR: u32 = 10;

fn planner() -> ReplyPlanner {
    ReplyPlanner::new(Arc::new(ComplexityConfig::default())).unwrap()
}

fn pool_set(contexts: &[ToneContext]) -> HashSet<&'static str> {
    contexts
        .iter()
        .flat_map(|context| pool_for(*context).iter().copied())
        .collect()
}

fn all_sounds() -> HashSet<&'static str> {
    pool_set(
        &[
            ToneContext::Standard,
            ToneContext::Question,
            ToneContext::Curious,
            ToneContext::Excited,
            ToneContext::Affectionate,
            ToneContext::Content,
            ToneContext::Playful,
            ToneContext::Sad,
            ToneContext::Sleepy,
            ToneContext::Demanding,
            ToneContext::Wary,
            ToneContext::Annoyed,
            ToneContext::Defensive,
            ToneContext::Hostile,
        ]
    )
}

fn sound_tokens<'a>(plan: &'a ReplyPlan, sounds: &HashSet<&'static str>) -> Vec<&'a str> {
    plan.tokens
        .iter()
        .map(|token| token.trim_end_matches(['.', '!', '?']))
        .filter(|token| sounds.contains(*token))
        .collect()
}

#[test]
fn bare_greeting_gets_a_very_short_reply() {
    let planner = planner();
    let sounds = all_sounds();
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..25 {
        let plan = planner.plan("hi", DAY_HOUR, &mut rng);
        assert!(plan.complexity <= 6, "complexity {} for a bare greeting", plan.complexity);
        let count = sound_tokens(&plan, &sounds).len();
        assert!((2..=5).contains(&count), "{} sounds for a bare greeting", count);
    }
}

#[test]
fn elaborate_academic_prompt_gets_a_long_reply() {
    let planner = planner();
    let sounds = all_sounds();
    let mut rng = StdRng::seed_from_u64(2);
    let prompt =
        "Please write me a comprehensive analysis of quantum physics and its philosophical implications, however surprising";
    for _ in 0..25 {
        let plan = planner.plan(prompt, DAY_HOUR, &mut rng);
        assert!(plan.complexity > 45, "complexity {} too low", plan.complexity);
        let count = sound_tokens(&plan, &sounds).len();
        assert!((30..=94).contains(&count), "{} sounds for an elaborate prompt", count);
    }
}

#[test]
fn hostile_input_draws_from_hostile_pools() {
    let planner = planner();
    let hostile = pool_set(&[ToneContext::Hostile, ToneContext::Defensive, ToneContext::Annoyed]);
    let sounds = all_sounds();
    let mut rng = StdRng::seed_from_u64(3);
    let plan = planner.plan("I hate this, it's horrible!!!", DAY_HOUR, &mut rng);

    assert_eq!(plan.sentiment.sentiment, catgpt::analysis::Sentiment::Negative);
    assert!(plan.sentiment.intensity >= catgpt::analysis::Intensity::High);

    let tokens = sound_tokens(&plan, &sounds);
    let hostile_count = tokens
        .iter()
        .filter(|token| hostile.contains(*token))
        .count();
    assert!(
        hostile_count * 2 > tokens.len(),
        "only {} of {} sounds were hostile",
        hostile_count,
        tokens.len()
    );
}

#[test]
fn every_sentence_of_a_plan_is_terminated() {
    let planner = planner();
    let mut rng = StdRng::seed_from_u64(4);
    for prompt in ["hello?", "I love my cute cat so much!", "tell me about food and treats"] {
        let plan = planner.plan(prompt, DAY_HOUR, &mut rng);
        for sentence in &plan.sentences {
            assert!(!sentence.is_empty());
            let last = sentence.chars().last().unwrap();
            assert!(!last.is_whitespace(), "sentence {:?} ends in whitespace", sentence);
        }
        assert_eq!(plan.tokens.join(" "), plan.sentences.join(" "));
    }
}

#[tokio::test]
async fn unknown_conversation_id_is_harmless() {
    let args = Args::parse_from(["catgpt"]);
    let agent = CatAgent::new(&args).unwrap();

    let history = agent.conversation_messages("no-such-conversation").await;
    assert!(history.is_empty());

    agent.record_message(
        "no-such-conversation",
        catgpt::models::chat::ChatMessage::now(catgpt::models::chat::Role::User, "hi")
    ).await;
    let history = agent.conversation_messages("no-such-conversation").await;
    assert!(history.is_empty());
}

#[tokio::test]
async fn known_conversation_records_both_sides() {
    let args = Args::parse_from(["catgpt"]);
    let agent = CatAgent::new(&args).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let id = agent.open_conversation().await.unwrap();
    agent.record_message(
        &id,
        catgpt::models::chat::ChatMessage::now(catgpt::models::chat::Role::User, "hi")
    ).await;

    let plan = agent.plan_reply("hi", DAY_HOUR, &mut rng);
    agent.record_message(
        &id,
        catgpt::models::chat::ChatMessage::now(
            catgpt::models::chat::Role::Assistant,
            plan.sentences.join(" ")
        )
    ).await;

    let history = agent.conversation_messages(&id).await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, catgpt::models::chat::Role::User);
    assert_eq!(history[1].role, catgpt::models::chat::Role::Assistant);
}
