use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::chat::ChatService;

const PROMPT: &str = "you> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Clear,
    Model(String),
    Message(String),
    Empty,
}

pub fn parse_command(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => ReplCommand::Empty,
        "exit" | "quit" => ReplCommand::Exit,
        "clear" => ReplCommand::Clear,
        _ => match trimmed.strip_prefix("/model") {
            Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
                let model = rest.trim();
                if model.is_empty() {
                    ReplCommand::Message(trimmed.to_string())
                } else {
                    ReplCommand::Model(model.to_string())
                }
            }
            _ => ReplCommand::Message(trimmed.to_string()),
        },
    }
}

fn print_banner(chat: &ChatService) {
    println!("{}", "=== Local Felix ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "model {} at {} | local documents {}",
            chat.model(),
            chat.host(),
            if chat.rag_enabled() { "on" } else { "off" }
        )
        .bright_black()
    );
    println!(
        "{}",
        "Type a message, 'clear' to reset the conversation, '/model <name>' to switch models, or 'exit' to quit."
            .bright_black()
    );
    println!();
}

fn print_reply(reply: &str) {
    if reply.starts_with("Error:") {
        eprintln!("{}", reply.red());
        return;
    }
    for line in reply.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

/// Read lines until `exit`/`quit` or end of input, one turn at a time.
pub async fn run(mut chat: ChatService) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    print_banner(&chat);

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        match parse_command(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => break,
            ReplCommand::Clear => {
                chat.clear_history();
                chat.restore_system_prompt();
                println!("{}", "Conversation history cleared.".bright_green());
            }
            ReplCommand::Model(model) => {
                chat.set_model(&model);
                println!("{}", format!("Switched to model {}.", model).bright_green());
            }
            ReplCommand::Message(text) => {
                let _ = rl.add_history_entry(line.as_str());
                let reply = chat.send_message(&text).await;
                print_reply(&reply);
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_command(""), ReplCommand::Empty);
        assert_eq!(parse_command("   \t "), ReplCommand::Empty);
    }

    #[test]
    fn control_words() {
        assert_eq!(parse_command("exit"), ReplCommand::Exit);
        assert_eq!(parse_command(" quit "), ReplCommand::Exit);
        assert_eq!(parse_command("clear"), ReplCommand::Clear);
    }

    #[test]
    fn control_words_ignore_case() {
        assert_eq!(parse_command("EXIT"), ReplCommand::Exit);
        assert_eq!(parse_command("Quit"), ReplCommand::Exit);
        assert_eq!(parse_command(" Clear "), ReplCommand::Clear);
        assert_eq!(
            parse_command("/model Llama3"),
            ReplCommand::Model("Llama3".to_string())
        );
    }

    #[test]
    fn model_switch() {
        assert_eq!(
            parse_command("/model llama3.2:3b"),
            ReplCommand::Model("llama3.2:3b".to_string())
        );
        assert_eq!(
            parse_command("/model"),
            ReplCommand::Message("/model".to_string())
        );
        assert_eq!(
            parse_command("/models please"),
            ReplCommand::Message("/models please".to_string())
        );
    }

    #[test]
    fn anything_else_is_a_message() {
        assert_eq!(
            parse_command("  clear my doubts about rust "),
            ReplCommand::Message("clear my doubts about rust".to_string())
        );
    }
}
