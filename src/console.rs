// ABOUTME: Console/CI log sink with grouped output.
// ABOUTME: The Actions implementation speaks ::group:: workflow commands.

/// Where reconstructed deployment logs go.
///
/// Within a stage, lines appear in the order the window released them;
/// a group is opened at most once per stage and always closed.
pub trait Console: Send + Sync {
    /// Open a named, bounded span of log lines for one stage.
    fn group_start(&self, title: &str);

    /// Close the currently open group.
    fn group_end(&self);

    /// Emit one log line.
    fn line(&self, message: &str);
}

/// GitHub-Actions-style console using workflow commands for grouping.
#[derive(Debug, Default)]
pub struct ActionsConsole;

impl Console for ActionsConsole {
    fn group_start(&self, title: &str) {
        println!("::group::{title}");
    }

    fn group_end(&self) {
        println!("::endgroup::");
    }

    fn line(&self, message: &str) {
        println!("{message}");
    }
}
