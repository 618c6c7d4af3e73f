//! Minimal builder for the provider's voice response markup. Only the verbs
//! this service speaks are modelled: `Say`, `Gather` (speech input) and
//! `Hangup`.

const GATHER_TIMEOUT_SECS: u32 = 6;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Verb {
    Say(String),
    Gather { action: String, prompts: Vec<String> },
    Hangup,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&mut self, text: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    /// Speaks `prompt` and gathers the caller's next utterance; the provider
    /// posts the transcript to `action`.
    pub fn gather(&mut self, action: impl Into<String>, prompt: impl Into<String>) -> &mut Self {
        self.verbs.push(Verb::Gather { action: action.into(), prompts: vec![prompt.into()] });
        self
    }

    pub fn hangup(&mut self) -> &mut Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Say(text) => {
                    xml.push_str("<Say>");
                    xml.push_str(&escape(text));
                    xml.push_str("</Say>");
                }
                Verb::Gather { action, prompts } => {
                    xml.push_str(&format!(
                        "<Gather input=\"speech\" action=\"{}\" method=\"POST\" \
                         speechTimeout=\"auto\" timeout=\"{GATHER_TIMEOUT_SECS}\">",
                        escape(action)
                    ));
                    for prompt in prompts {
                        xml.push_str("<Say>");
                        xml.push_str(&escape(prompt));
                        xml.push_str("</Say>");
                    }
                    xml.push_str("</Gather>");
                }
                Verb::Hangup => xml.push_str("<Hangup/>"),
            }
        }
        xml.push_str("</Response>");
        xml
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
