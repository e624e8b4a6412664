/// A quick-start prompt shown on an empty conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestedPrompt {
    pub category: &'static str,
    pub text: &'static str,
}

pub const SUGGESTED_PROMPTS: [SuggestedPrompt; 4] = [
    SuggestedPrompt { category: "Learn", text: "Explain quantum computing in simple terms" },
    SuggestedPrompt { category: "Code", text: "Write a Python function to sort a list" },
    SuggestedPrompt { category: "Work", text: "Help me write a professional email" },
    SuggestedPrompt { category: "Tips", text: "Give me 5 productivity tips for developers" },
];

/// Look up a suggested prompt by its 1-based number as shown on screen.
#[must_use]
pub fn by_number(number: usize) -> Option<&'static SuggestedPrompt> {
    number.checked_sub(1).and_then(|i| SUGGESTED_PROMPTS.get(i))
}
