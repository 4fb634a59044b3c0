use dialoguer::Confirm;
use friendassign_flows::board::{ConfirmPrompt, Confirmer};
use tracing::warn;

/// Asks on the terminal. `assume_yes` answers every prompt without asking, for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirmer {
    assume_yes: bool,
}

impl TerminalConfirmer {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        if self.assume_yes {
            return true;
        }

        let question = format!("{} {} ({})", prompt.title, prompt.text, prompt.confirm_label);
        let default = prompt.default;
        let answer = tokio::task::spawn_blocking(move || {
            Confirm::new()
                .with_prompt(question)
                .default(default)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                warn!(%err, "could not read confirmation, treating it as no");
                default
            }
            Err(err) => {
                warn!(%err, "confirmation prompt failed");
                default
            }
        }
    }
}
