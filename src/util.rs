use std::str::FromStr;

use anyhow::{Result, bail};
use shakmaty::Square;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Drag { from: Square, to: Square },
    PlayAgain,
    SetPosition(Option<String>),
    Flip,
    Show,
    Help,
    Quit,
}

/// Accepts "e2e4", "e2 e4" and "e2-e4". A trailing promotion letter is tolerated and
/// ignored, promotions always go to a queen.
pub fn parse_square_pair(input: &str) -> Result<(Square, Square)> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();

    if !compact.is_ascii() {
        bail!("expected two squares like 'e2e4', got '{}'", input.trim());
    }

    let squares = match compact.len() {
        4 => &compact[..],
        5 if compact.ends_with(['q', 'r', 'b', 'n']) => &compact[..4],
        _ => bail!("expected two squares like 'e2e4', got '{}'", input.trim()),
    };

    let from = Square::from_str(&squares[0..2])?;
    let to = Square::from_str(&squares[2..4])?;

    Ok((from, to))
}

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "play" | "reset" | "new" => Command::PlayAgain,
        "setpos" | "fen" => match rest {
            "" => Command::SetPosition(None),
            fen => Command::SetPosition(Some(fen.to_string())),
        },
        "flip" => Command::Flip,
        "board" | "show" => Command::Show,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "" => bail!("empty command"),
        _ => {
            let (from, to) = parse_square_pair(line)?;
            Command::Drag { from, to }
        }
    };

    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_pairs_in_any_spelling() {
        for input in ["e2e4", "e2 e4", "e2-e4", " E2E4 ", "e2e4q"] {
            assert_eq!(
                parse_square_pair(input).unwrap(),
                (Square::E2, Square::E4),
                "{input}"
            );
        }
        assert!(parse_square_pair("e2").is_err());
        assert!(parse_square_pair("e9e4").is_err());
        assert!(parse_square_pair("e2e4e5").is_err());
        assert!(parse_square_pair("aéb").is_err());
        assert!(parse_square_pair("aé1q").is_err());
        assert!(parse_square_pair("é2é4").is_err());
    }

    #[test]
    fn control_commands() {
        assert_eq!(parse_command("play").unwrap(), Command::PlayAgain);
        assert_eq!(parse_command("flip").unwrap(), Command::Flip);
        assert_eq!(parse_command("QUIT").unwrap(), Command::Quit);
        assert_eq!(parse_command("setpos").unwrap(), Command::SetPosition(None));
        assert_eq!(
            parse_command("setpos 4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap(),
            Command::SetPosition(Some("4k3/8/8/8/8/8/8/4K3 w - - 0 1".to_string()))
        );
        assert_eq!(
            parse_command("g1 f3").unwrap(),
            Command::Drag {
                from: Square::G1,
                to: Square::F3
            }
        );
        assert!(parse_command("").is_err());
        assert!(parse_command("castle please").is_err());
        assert!(parse_command("aéb").is_err());
        assert!(parse_command("aé1q").is_err());
    }
}
