//! Output rendering

use anyhow::Result;
use codetree_client::ErrorMessage;
use codetree_model::{walk, EntryKind, Node, RepoContext};

use crate::commands::OutputFormat;

pub fn print_tree(repo: &RepoContext, nodes: &[Node], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(nodes)?),
        OutputFormat::Plain => print!("{}", render_plain(repo, nodes)),
    }
    Ok(())
}

pub fn print_error(message: &ErrorMessage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(message)?),
        OutputFormat::Plain => {
            eprintln!("{}", message.error);
            eprintln!("{}", strip_tags(&message.message));
        }
    }
    Ok(())
}

/// One line per node, two spaces per level
pub fn render_plain(repo: &RepoContext, nodes: &[Node]) -> String {
    let mut out = format!("{}@{}\n", repo.slug(), repo.branch);
    for (depth, node) in walk(nodes) {
        let name = node.path.rsplit('/').next().unwrap_or(&node.path);
        let indent = "  ".repeat(depth + 1);
        let line = match node.kind {
            EntryKind::Tree if node.is_lazy() => format!("{}{}/ …", indent, name),
            EntryKind::Tree => format!("{}{}/", indent, name),
            EntryKind::Blob => format!("{}{}", indent, name),
            EntryKind::Commit => {
                let short_sha: String = node.sha.chars().take(7).collect();
                match node.href() {
                    Some(href) => format!("{}{} @ {} -> {}", indent, name, short_sha, href),
                    None => format!("{}{} @ {}", indent, name, short_sha),
                }
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Plain-text rendering of a message; `<br>` becomes a line break
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' if !in_tag => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                if tag.trim_end_matches('/').trim().eq_ignore_ascii_case("br") {
                    text.push('\n');
                }
            }
            _ if in_tag => tag.push(c),
            _ => text.push(c),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetree_model::{BuildContext, BuildMode, GitHubStyleLinks, TreeBuilder, TreeEntry};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_render_plain() {
        let repo = RepoContext::new("octocat", "hello", "main");
        let mut submodules = codetree_model::SubmoduleMap::new();
        submodules.insert("vendor".to_string(), "https://github.com/x/vendor.git".to_string());
        let ctx = BuildContext::new(
            repo.clone(),
            Arc::new(GitHubStyleLinks::new(&["github.com"])),
            BuildMode::Full,
        )
        .with_submodules(submodules);
        let nodes = TreeBuilder::new(
            vec![
                TreeEntry::new("src", EntryKind::Tree, "t1"),
                TreeEntry::new("src/main.rs", EntryKind::Blob, "b1"),
                TreeEntry::new("vendor", EntryKind::Commit, "0123456789"),
            ],
            ctx,
        )
        .build();

        assert_eq!(
            render_plain(&repo, &nodes),
            "octocat/hello@main\n  src/\n    main.rs\n  vendor @ 0123456 -> https://github.com/x/vendor\n"
        );
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("Token is invalid.<br/>Follow <a href=\"u\">this link</a>."),
            "Token is invalid.\nFollow this link."
        );
        assert_eq!(strip_tags("a<br>b<BR />c"), "a\nb\nc");
    }
}
