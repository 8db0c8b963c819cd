//! AI flows: prompt, response schema, and shape validation for each call.
//!
//! Every flow degrades gracefully. Callers get `Err` (or `None`) on any
//! failure and pick the fallback themselves; nothing here panics on model output.

use anyhow::bail;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::companion::Companion;
use crate::services::genai::{ChatRole, ChatTurn, GenAiClient};
use crate::services::safety::{redact_contact_details, safety_policy};

const MAX_HISTORY_TURNS: usize = 12;

// ── Emotion check ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionCheck {
    pub is_emotion: bool,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub example: String,
}

impl EmotionCheck {
    fn validate(self) -> anyhow::Result<Self> {
        if self.is_emotion && self.definition.trim().is_empty() {
            bail!("emotion check returned no definition");
        }
        Ok(self)
    }

    /// Description stored on the emotion: definition plus example.
    pub fn description(&self) -> String {
        match (self.definition.trim(), self.example.trim()) {
            (d, "") => d.to_string(),
            (d, e) => format!("{} For example: {}", d, e),
        }
    }
}

pub fn emotion_check_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "is_emotion": { "type": "BOOLEAN" },
            "definition": { "type": "STRING" },
            "example": { "type": "STRING" }
        },
        "required": ["is_emotion", "definition", "example"]
    })
}

pub fn emotion_check_prompt(name: &str) -> String {
    format!(
        "A child wants to add \"{}\" to their list of feelings.\n\
         Decide whether it is a real human emotion or feeling (not an object, person, food, or random text).\n\
         If it is, give a one-sentence definition a 7 year old understands and a short example situation.\n\
         If it is not, set is_emotion to false and leave the other fields empty.",
        name.trim()
    )
}

pub async fn check_emotion(client: &GenAiClient, name: &str) -> anyhow::Result<EmotionCheck> {
    let check: EmotionCheck = client
        .generate_json(None, &emotion_check_prompt(name), emotion_check_schema())
        .await?;
    check.validate()
}

// ── Calming exercise ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct CalmingSuggestion {
    exercise: String,
}

const FALLBACK_EXERCISES: &[&str] = &[
    "Try smelling a pretend flower: breathe in slowly through your nose, then blow out a pretend candle.",
    "Squeeze your hands into tight fists, count to five, then let them go floppy like spaghetti.",
    "Look around and find five things you can see, four you can touch, and three you can hear.",
    "Give yourself a big bear hug and take three slow, deep breaths.",
];

/// Exercise used when the model is unavailable.
pub fn fallback_exercise() -> &'static str {
    FALLBACK_EXERCISES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_EXERCISES[0])
}

pub fn calming_prompt(emotion: &str, reflection: &str) -> String {
    format!(
        "A child just wrote in their feelings diary.\n\
         Feeling: {}\n\
         What they wrote: \"{}\"\n\
         Suggest ONE short, simple calming or grounding exercise (max 2 sentences) they can do right now. \
         Be warm and encouraging. Do not give medical advice.",
        emotion,
        redact_contact_details(reflection.trim())
    )
}

/// Suggest a calming exercise. Falls back to a canned one when the model is
/// unreachable or answers with nothing.
pub async fn suggest_calming_exercise(
    client: &GenAiClient,
    emotion: &str,
    reflection: &str,
) -> String {
    let schema = json!({
        "type": "OBJECT",
        "properties": { "exercise": { "type": "STRING" } },
        "required": ["exercise"]
    });

    match client
        .generate_json::<CalmingSuggestion>(None, &calming_prompt(emotion, reflection), schema)
        .await
    {
        Ok(s) if !s.exercise.trim().is_empty() => s.exercise.trim().to_string(),
        Ok(_) => fallback_exercise().to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Calming exercise suggestion unavailable");
            fallback_exercise().to_string()
        }
    }
}

// ── Companion chat ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
struct ChatReply {
    reply: String,
}

pub fn companion_system_prompt(companion: &Companion, child_name: &str) -> String {
    format!(
        "{}\nYou are chatting with {}, a child who uses a feelings diary app.\n\
         Keep replies under 60 words, warm, and easy to read.\n\n{}",
        companion.persona,
        child_name,
        safety_policy()
    )
}

pub fn fallback_reply(companion: &Companion) -> String {
    format!(
        "{} is taking a little nap right now. Try writing about your feelings in your diary, and come back to chat soon!",
        companion.name
    )
}

/// History trimmed to the most recent turns, ending with the new message.
pub fn chat_turns(history: &[ChatTurn], message: &str) -> Vec<ChatTurn> {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
    let mut turns: Vec<ChatTurn> = history[start..]
        .iter()
        .map(|t| ChatTurn {
            role: t.role,
            text: redact_contact_details(&t.text),
        })
        .collect();
    turns.push(ChatTurn {
        role: ChatRole::User,
        text: redact_contact_details(message),
    });
    turns
}

pub async fn companion_reply(
    client: &GenAiClient,
    companion: &Companion,
    child_name: &str,
    history: &[ChatTurn],
    message: &str,
) -> anyhow::Result<String> {
    let schema = json!({
        "type": "OBJECT",
        "properties": { "reply": { "type": "STRING" } },
        "required": ["reply"]
    });
    let system = companion_system_prompt(companion, child_name);
    let reply: ChatReply = client
        .generate_json_from_turns(Some(&system), &chat_turns(history, message), schema)
        .await?;

    let text = reply.reply.trim();
    if text.is_empty() {
        bail!("companion returned an empty reply");
    }
    Ok(text.to_string())
}

// ── Avatar image ────────────────────────────────────────────────────────────

pub fn avatar_prompt(description: &str) -> String {
    format!(
        "A cute, friendly cartoon avatar for a child's app: {}. \
         Bright colors, simple shapes, soft lighting, plain background, no text, no real people.",
        description.trim()
    )
}

/// Accept only inline image data.
pub fn is_image_data_uri(uri: &str) -> bool {
    uri.starts_with("data:image/") && uri.contains(";base64,") && !uri.ends_with(";base64,")
}

pub async fn generate_avatar(client: &GenAiClient, description: &str) -> anyhow::Result<String> {
    let uri = client.generate_image(&avatar_prompt(description)).await?;
    if !is_image_data_uri(&uri) {
        bail!("image response was not an inline image");
    }
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::companion::COMPANIONS;
    use crate::services::safety::SAFETY_SCRIPT;

    #[test]
    fn test_emotion_check_requires_definition() {
        let ok = EmotionCheck {
            is_emotion: true,
            definition: "Feeling thankful.".into(),
            example: "When a friend shares a snack.".into(),
        };
        assert!(ok.validate().is_ok());

        let missing = EmotionCheck {
            is_emotion: true,
            definition: "  ".into(),
            example: String::new(),
        };
        assert!(missing.validate().is_err());

        let not_emotion = EmotionCheck {
            is_emotion: false,
            definition: String::new(),
            example: String::new(),
        };
        assert!(not_emotion.validate().is_ok());
    }

    #[test]
    fn test_emotion_check_parses_with_missing_optionals() {
        let check: EmotionCheck = serde_json::from_str(r#"{"is_emotion": false}"#).unwrap();
        assert!(!check.is_emotion);
        assert!(check.definition.is_empty());
    }

    #[test]
    fn test_description_joins_definition_and_example() {
        let check = EmotionCheck {
            is_emotion: true,
            definition: "Feeling thankful.".into(),
            example: "When a friend shares a snack.".into(),
        };
        assert_eq!(
            check.description(),
            "Feeling thankful. For example: When a friend shares a snack."
        );
    }

    #[test]
    fn test_system_prompt_embeds_persona_and_safety_script() {
        let prompt = companion_system_prompt(&COMPANIONS[0], "Sam");
        assert!(prompt.contains(COMPANIONS[0].persona));
        assert!(prompt.contains("Sam"));
        assert!(prompt.contains(SAFETY_SCRIPT));
    }

    #[test]
    fn test_chat_turns_trims_history_and_appends_message() {
        let history: Vec<ChatTurn> = (0..20)
            .map(|i| ChatTurn {
                role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Model },
                text: format!("turn {}", i),
            })
            .collect();
        let turns = chat_turns(&history, "call me at 555 123 4567");
        assert_eq!(turns.len(), MAX_HISTORY_TURNS + 1);
        assert_eq!(turns[0].text, "turn 8");
        let last = turns.last().unwrap();
        assert_eq!(last.role, ChatRole::User);
        assert!(last.text.contains("[phone]"));
    }

    #[test]
    fn test_fallback_exercise_is_from_list() {
        assert!(FALLBACK_EXERCISES.contains(&fallback_exercise()));
    }

    #[tokio::test]
    async fn test_calming_exercise_falls_back_without_model() {
        let client = GenAiClient::new(&crate::config::Config::for_tests()).unwrap();
        let tip = suggest_calming_exercise(&client, "Angry", "my brother broke my lego").await;
        assert!(FALLBACK_EXERCISES.contains(&tip.as_str()));
    }

    #[test]
    fn test_is_image_data_uri() {
        assert!(is_image_data_uri("data:image/png;base64,AAAA"));
        assert!(!is_image_data_uri("data:image/png;base64,"));
        assert!(!is_image_data_uri("https://example.com/a.png"));
        assert!(!is_image_data_uri("data:text/html;base64,AAAA"));
    }

    #[test]
    fn test_fallback_reply_names_companion() {
        assert!(fallback_reply(&COMPANIONS[1]).starts_with("Penny the Puppy"));
    }
}
