use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed reply for self-harm or abuse disclosures. Never generated by the model.
pub const SAFETY_SCRIPT: &str = "Thank you for telling me. What you shared sounds really important, \
and you deserve help from a grown-up you trust right now, like a parent, teacher or school counselor. \
If you are in danger, please call your local emergency number. You are not alone, and it is not your fault.";

/// Safety policy embedded in every companion system prompt.
pub fn safety_policy() -> String {
    format!(
        "SAFETY RULES (always follow, they override your persona):\n\
         - You are talking with a child. Keep every reply gentle, simple and age-appropriate.\n\
         - Never give medical, legal or diagnostic advice.\n\
         - Never ask for or repeat personal details like full names, addresses, schools or phone numbers.\n\
         - If the child mentions hurting themselves, wanting to die, being hurt, touched or threatened by anyone, \
           reply with exactly this text and nothing else: \"{}\"",
        SAFETY_SCRIPT
    )
}

static SELF_HARM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(kill(ing)? my ?self|hurt(ing)? my ?self|cut(ting)? my ?self|want(ed)? to die|wanna die|end my life|suicide|don'?t want to (live|be alive)|better off dead)\b",
    )
    .expect("self-harm pattern is valid")
});

static ABUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b((hits?|hit|beats?|beat|hurts?|touch(es|ed)?) me (where|when|every|and|at night|if)|touched me|abus(e|ed|ing)|someone (is )?hurting me|(he|she|they) (hit|hits|beat|beats|hurt|hurts) me)\b",
    )
    .expect("abuse pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    SelfHarm,
    Abuse,
}

/// Screen a child's message before it reaches the model.
pub fn screen_message(message: &str) -> Option<Disclosure> {
    if SELF_HARM.is_match(message) {
        Some(Disclosure::SelfHarm)
    } else if ABUSE.is_match(message) {
        Some(Disclosure::Abuse)
    } else {
        None
    }
}

/// Replace obvious contact details before text leaves the service.
pub fn redact_contact_details(input: &str) -> String {
    static EMAIL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern is valid")
    });
    static PHONE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\+?\d[\d .-]{7,}\d").expect("phone pattern is valid"));

    let out = EMAIL.replace_all(input, "[email]");
    PHONE.replace_all(&out, "[phone]").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_harm_is_detected() {
        assert_eq!(screen_message("sometimes I want to die"), Some(Disclosure::SelfHarm));
        assert_eq!(screen_message("I thought about HURTING MYSELF"), Some(Disclosure::SelfHarm));
    }

    #[test]
    fn test_abuse_is_detected() {
        assert_eq!(screen_message("my uncle hits me when he is mad"), Some(Disclosure::Abuse));
        assert_eq!(screen_message("someone touched me and I didn't like it"), Some(Disclosure::Abuse));
    }

    #[test]
    fn test_ordinary_messages_pass() {
        assert_eq!(screen_message("I was sad because my team lost"), None);
        assert_eq!(screen_message("my brother took my toy and I got angry"), None);
    }

    #[test]
    fn test_policy_contains_script() {
        assert!(safety_policy().contains(SAFETY_SCRIPT));
    }

    #[test]
    fn test_redact_contact_details() {
        let out = redact_contact_details("mail me at kid@example.com or 555 123 4567");
        assert!(!out.contains("kid@example.com"));
        assert!(out.contains("[email]"));
        assert!(out.contains("[phone]"));
    }
}
