//! Confirmation policies for destructive steps

/// Decides whether a destructive step may proceed
pub trait Policy {
    /// Whether to go ahead with the step described by `prompt`
    fn should_proceed(&self, prompt: &str) -> bool;

    /// Process exit status after this policy declined a step.
    ///
    /// Only a person who explicitly answered "no" ends the run successfully.
    fn denial_exit_code(&self, _is_interactive: bool) -> i32 {
        1
    }
}

/// Always proceeds (`--force`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAlwaysPolicy;

impl Policy for AllowAlwaysPolicy {
    fn should_proceed(&self, _prompt: &str) -> bool {
        true
    }
}

/// Never proceeds; used for non-interactive runs without `--force`
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAlwaysPolicy;

impl Policy for DenyAlwaysPolicy {
    fn should_proceed(&self, _prompt: &str) -> bool {
        false
    }
}

type Prompter = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Asks the user every time
pub struct AskAlwaysPolicy {
    prompter: Prompter,
}

impl AskAlwaysPolicy {
    /// Prompt on the terminal
    pub fn new() -> Self {
        Self::with_prompter(confirm_on_terminal)
    }

    /// Use a custom yes/no prompt
    pub fn with_prompter(prompter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            prompter: Box::new(prompter),
        }
    }
}

impl Default for AskAlwaysPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AskAlwaysPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskAlwaysPolicy").finish_non_exhaustive()
    }
}

impl Policy for AskAlwaysPolicy {
    fn should_proceed(&self, prompt: &str) -> bool {
        (self.prompter)(prompt)
    }

    fn denial_exit_code(&self, is_interactive: bool) -> i32 {
        if is_interactive {
            0
        } else {
            1
        }
    }
}

fn confirm_on_terminal(prompt: &str) -> bool {
    match dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
    {
        Ok(answer) => answer,
        Err(e) => {
            log::warn!("Could not read confirmation: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_allow_and_deny() {
        assert!(AllowAlwaysPolicy.should_proceed("drop?"));
        assert!(!DenyAlwaysPolicy.should_proceed("drop?"));
        assert_eq!(DenyAlwaysPolicy.denial_exit_code(true), 1);
        assert_eq!(DenyAlwaysPolicy.denial_exit_code(false), 1);
    }

    #[test]
    fn test_ask_uses_prompter_every_time() {
        let asked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&asked);
        let policy = AskAlwaysPolicy::with_prompter(move |prompt| {
            counter.fetch_add(1, Ordering::SeqCst);
            prompt.contains("recreate")
        });

        assert!(policy.should_proceed("drop and recreate?"));
        assert!(!policy.should_proceed("drop?"));
        assert_eq!(asked.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_declined_prompt_exit_code() {
        let policy = AskAlwaysPolicy::with_prompter(|_| false);
        assert_eq!(policy.denial_exit_code(true), 0);
        assert_eq!(policy.denial_exit_code(false), 1);
    }
}
