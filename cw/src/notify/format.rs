//! Message rendering for one branch's batch of commits

use chrono_tz::Tz;

use crate::domain::Commit;

/// Line placed between commit blocks
pub const DIVIDER: &str = "--------------------";

/// Build the chat message for `commits` pushed to `branch` of `repo`
///
/// One block per commit, in the order given, separated by [`DIVIDER`].
pub fn format_message(repo: &str, branch: &str, commits: &[Commit], tz: &Tz) -> String {
    let header = format!("**New commits** in `{}` on branch `{}`", repo, branch);
    let blocks: Vec<String> = commits.iter().map(|c| format_commit(c, tz)).collect();

    format!("{}\n{}", header, blocks.join(&format!("\n{}\n", DIVIDER)))
}

fn format_commit(commit: &Commit, tz: &Tz) -> String {
    let author = match commit.author_login() {
        Some(login) => format!("{} (@{})", commit.author_name(), login),
        None => commit.author_name().to_string(),
    };
    let date = commit
        .authored_at()
        .map(|at| at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S %Z").to_string())
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "{}\nAuthor: {}\nDate: {}\n{}",
        commit.message().trim(),
        author,
        date,
        commit.html_url
    )
}
