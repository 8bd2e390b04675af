//! Interactive terminal channel: rustyline input loop, observer-callback
//! rendering and a lightweight markdown formatter.

use std::path::PathBuf;

use crossterm::style::Stylize;
use regex::Regex;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agent::{Agent, AgentCallbacks, SCAN_SENTINEL};
use crate::workspace::Workspace;

/// Callbacks that print agent activity to the terminal.
pub struct CliCallbacks;

impl AgentCallbacks for CliCallbacks {
    fn on_assistant_text(&self, text: &str) {
        // The scan sentinel is plumbing, not conversation.
        if text.trim() == SCAN_SENTINEL {
            return;
        }
        println!("\n{} {}", "🦐".green(), render_markdown(text));
    }

    fn on_tool_call(&self, name: &str, args: &serde_json::Value) {
        let summary = args
            .as_object()
            .map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let mut value = v.to_string();
                        if value.len() > 60 {
                            value.truncate(60);
                            value.push('…');
                        }
                        format!("{}={}", k, value)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!("{}", format!("  ⚙️  {}({})", name, summary).dim());
    }

    fn on_tool_result(&self, name: &str, result: &str) {
        let mut shown = result.replace('\n', " ");
        if shown.len() > 200 {
            let mut cut = 200;
            while !shown.is_char_boundary(cut) {
                cut -= 1;
            }
            shown.truncate(cut);
            shown.push('…');
        }
        println!("{}", format!("  ✓  {} → {}", name, shown).dim());
    }

    fn on_heartbeat_start(&self) {
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        println!("{}", format!("\n💓 Heartbeat scan [{}]...", ts).dim());
    }

    fn on_heartbeat_end(&self, result: &str) {
        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        println!("{}", format!("💓 [{}] {}\n", ts, result).dim());
    }
}

/// Run the interactive prompt until the user exits.
pub async fn run_repl(agent: Agent, workspace: Workspace) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let user_dir = workspace.user_dir();

    let mut multiline_buffer: Option<Vec<String>> = None;

    loop {
        let prompt = if multiline_buffer.is_some() {
            "... ".dim().to_string()
        } else {
            "You: ".cyan().to_string()
        };

        // Blocking readline off the runtime so heartbeat scans keep running
        // while the prompt idles.
        let (returned_editor, line) = tokio::task::spawn_blocking(move || {
            let line = editor.readline(&prompt);
            (editor, line)
        })
        .await?;
        editor = returned_editor;

        let line = match line {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        // Multiline mode: collect until the closing marker.
        if let Some(buffer) = multiline_buffer.as_mut() {
            if line.trim() == "\"\"\"" {
                let text = buffer.join("\n").trim().to_string();
                multiline_buffer = None;
                if !text.is_empty() {
                    handle_message(&agent, &text).await;
                }
            } else {
                buffer.push(line);
            }
            continue;
        }

        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(&input);

        if input == "\"\"\"" {
            println!(
                "{}",
                "📝 Multiline mode — type \"\"\" on a new line to send".dim()
            );
            multiline_buffer = Some(Vec::new());
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        // Dragging a file onto the terminal pastes its path; copy it into
        // user/ instead of chatting about it.
        if let Some(path) = detect_dropped_path(&input) {
            match copy_into_user_dir(&path, &user_dir).await {
                Ok(message) => println!("{}", message.green()),
                Err(e) => println!("{}", format!("Could not copy file: {}", e).red()),
            }
            continue;
        }

        handle_message(&agent, &input).await;
    }

    println!("{}", "\nGoodbye! 🦐\n".dim());
    agent.stop();
    Ok(())
}

async fn handle_message(agent: &Agent, text: &str) {
    println!("{}", "⏳ Thinking...".dim());
    if let Err(e) = agent.chat(text).await {
        println!("{}", format!("\nError: {}\n", e).red());
    }
}

/// Recognize a pasted filesystem path (absolute or `~`-prefixed), as
/// produced by terminal drag-and-drop. Quotes and escaped spaces are
/// stripped.
fn detect_dropped_path(input: &str) -> Option<PathBuf> {
    let cleaned = input
        .trim_matches(|c| c == '\'' || c == '"')
        .replace("\\ ", " ");
    let cleaned = cleaned.trim();

    let expanded = if let Some(rest) = cleaned.strip_prefix("~/") {
        dirs::home_dir()?.join(rest)
    } else if cleaned.starts_with('/') {
        PathBuf::from(cleaned)
    } else {
        return None;
    };

    expanded.is_file().then_some(expanded)
}

async fn copy_into_user_dir(source: &PathBuf, user_dir: &PathBuf) -> std::io::Result<String> {
    let file_name = source
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"))?;
    let dest = user_dir.join(file_name);
    tokio::fs::copy(source, &dest).await?;
    let size_kb = tokio::fs::metadata(&dest).await?.len() as f64 / 1024.0;
    Ok(format!(
        "✓ Copied to user/{} ({:.1} KB)",
        file_name.to_string_lossy(),
        size_kb
    ))
}

/// Minimal markdown-to-ANSI rendering: headers, emphasis, inline code,
/// fenced blocks, lists, quotes and rules.
pub fn render_markdown(text: &str) -> String {
    let fence = Regex::new(r"(?s)```(\w*)\n(.*?)```").expect("static regex");

    // Pull fenced code blocks out first so inline rules don't chew on them.
    let mut code_blocks = Vec::new();
    let mut processed = fence
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let lang = &caps[1];
            let code = caps[2].trim_end();
            let rule = "─".repeat(40).dim().to_string();
            let label = if lang.is_empty() {
                String::new()
            } else {
                format!("  [{}]", lang).dim().to_string()
            };
            code_blocks.push(format!(
                "{}{}\n{}\n{}",
                rule,
                label,
                code.yellow(),
                "─".repeat(40).dim()
            ));
            format!("\u{1}CODE{}\u{1}", code_blocks.len() - 1)
        })
        .to_string();

    processed = replace_lines(&processed, r"^### (.+)$", |s| {
        format!("   {}", s.green().bold())
    });
    processed = replace_lines(&processed, r"^## (.+)$", |s| {
        format!("  {}", s.green().bold())
    });
    processed = replace_lines(&processed, r"^# (.+)$", |s| {
        s.magenta().bold().underlined().to_string()
    });
    processed = replace_lines(&processed, r"^> (.+)$", |s| {
        format!("  │ {}", s).grey().italic().to_string()
    });
    processed = replace_lines(&processed, r"^---$", |_| "─".repeat(40).dim().to_string());

    let bold = Regex::new(r"\*\*(.+?)\*\*").expect("static regex");
    processed = bold
        .replace_all(&processed, |caps: &regex::Captures<'_>| {
            caps[1].to_string().bold().to_string()
        })
        .to_string();

    let code = Regex::new(r"`([^`]+)`").expect("static regex");
    processed = code
        .replace_all(&processed, |caps: &regex::Captures<'_>| {
            caps[1].to_string().yellow().to_string()
        })
        .to_string();

    let bullets = Regex::new(r"(?m)^- ").expect("static regex");
    processed = bullets.replace_all(&processed, "  • ").to_string();

    for (i, block) in code_blocks.iter().enumerate() {
        processed = processed.replace(&format!("\u{1}CODE{}\u{1}", i), block);
    }
    processed
}

fn replace_lines(text: &str, pattern: &str, f: impl Fn(&str) -> String) -> String {
    let re = Regex::new(&format!("(?m){}", pattern)).expect("static regex");
    re.replace_all(text, |caps: &regex::Captures<'_>| {
        f(caps.get(1).map(|m| m.as_str()).unwrap_or(""))
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_dropped_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.pdf");
        std::fs::write(&file, "x").unwrap();

        let quoted = format!("'{}'", file.display());
        assert_eq!(detect_dropped_path(&quoted), Some(file.clone()));
        assert_eq!(detect_dropped_path(file.to_str().unwrap()), Some(file));

        assert_eq!(detect_dropped_path("hello there"), None);
        assert_eq!(detect_dropped_path("/does/not/exist"), None);
    }

    #[test]
    fn test_detect_dropped_path_with_escaped_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("my report.pdf");
        std::fs::write(&file, "x").unwrap();

        let escaped = file.display().to_string().replace(' ', "\\ ");
        assert_eq!(detect_dropped_path(&escaped), Some(file));
    }

    #[test]
    fn test_render_markdown_keeps_text() {
        let rendered = render_markdown("# Title\n\nSome **bold** and `code`.\n- item");
        assert!(rendered.contains("Title"));
        assert!(rendered.contains("bold"));
        assert!(rendered.contains("code"));
        assert!(rendered.contains("  • item"));
    }

    #[test]
    fn test_render_markdown_code_block_survives() {
        let rendered = render_markdown("before\n```rust\nlet x = **not bold**;\n```\nafter");
        assert!(rendered.contains("let x = **not bold**;"));
        assert!(rendered.contains("[rust]"));
    }
}
