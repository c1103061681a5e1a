use crate::board::{Color, Square};
use crate::game::{GameConfig, GameEvent, GameState, Selection};
use crate::layout::BoardLayout;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::Receiver;

/// Line-oriented presentation layer over a `GameState`.
pub struct ConsoleHandler {
    game: GameState,
    events: Receiver<GameEvent>,
}

impl ConsoleHandler {
    pub fn new(config: GameConfig) -> Result<Self> {
        let mut game = GameState::new(config);
        // Subscribe before setup so a computer opening move is reported too.
        let events = game.subscribe();
        game.initialize_from_layout(&BoardLayout::standard())?;
        Ok(Self { game, events })
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        print!("{}", self.game.board());
        print!("{}", self.drain_events());
        stdout.flush()?;

        while reader.read_line(&mut line)? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }
            match self.handle_command(command) {
                Ok(response) => print!("{}", response),
                Err(e) => println!("error: {}", e),
            }
            stdout.flush()?;
            line.clear();
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "board" => Ok(self.game.board().to_string()),
            "select" => self.handle_select(&parts[1..]),
            "moves" => self.handle_moves(&parts[1..]),
            "score" => Ok(self.handle_score()),
            "restart" => {
                self.game.restart()?;
                let mut response = self.drain_events();
                response.push_str(&self.game.board().to_string());
                Ok(response)
            }
            "quit" => Ok(String::new()),
            other => Ok(format!("unknown command: {}\n", other)),
        }
    }

    fn handle_select(&mut self, parts: &[&str]) -> Result<String> {
        let square: Square = match parts.first() {
            Some(text) => text.parse()?,
            None => return Ok("usage: select <square>\n".to_string()),
        };

        let mut response = match self.game.select_or_move_at(square) {
            Selection::Selected(id) => format!(
                "selected {} on {}: {}\n",
                self.game.piece(id).kind,
                square,
                format_squares(self.game.legal_destinations(id))
            ),
            Selection::Deselected => "deselected\n".to_string(),
            Selection::Moved { .. } => String::new(),
            Selection::Ignored => "ignored\n".to_string(),
        };
        response.push_str(&self.drain_events());
        Ok(response)
    }

    fn handle_moves(&self, parts: &[&str]) -> Result<String> {
        let square: Square = match parts.first() {
            Some(text) => text.parse()?,
            None => return Ok("usage: moves <square>\n".to_string()),
        };
        match self.game.board().piece_at(square) {
            Some(id) => Ok(format!("{}\n", format_squares(self.game.legal_destinations(id)))),
            None => Ok(format!("no piece on {}\n", square)),
        }
    }

    fn handle_score(&self) -> String {
        format!(
            "White {} Black {}\n",
            self.game.player(Color::White).score(),
            self.game.player(Color::Black).score()
        )
    }

    fn drain_events(&self) -> String {
        let mut out = String::new();
        let mut moved = false;
        while let Ok(event) = self.events.try_recv() {
            match event {
                GameEvent::TurnCompleted {
                    color,
                    kind,
                    from,
                    to,
                    captured,
                    promoted,
                    ..
                } => {
                    moved = true;
                    out.push_str(&format!("{} {} {} -> {}", color, kind, from, to));
                    if let Some(captured) = captured {
                        out.push_str(&format!(" takes {}", captured));
                    }
                    if promoted {
                        out.push_str(" and promotes");
                    }
                    out.push('\n');
                }
                GameEvent::GameFinished { winner } => {
                    out.push_str(&format!("checkmate, {} wins\n", winner));
                }
                GameEvent::GameRestarted => out.push_str("game restarted\n"),
            }
        }
        if moved {
            out.push_str(&self.game.board().to_string());
        }
        out
    }
}

fn format_squares(squares: &[Square]) -> String {
    if squares.is_empty() {
        return "(none)".to_string();
    }
    squares
        .iter()
        .map(|square| square.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_select_and_move() {
        let config = GameConfig::default().with_computer(None);
        let mut console = ConsoleHandler::new(config).unwrap();

        let response = console.handle_command("select e2").unwrap();
        assert!(response.starts_with("selected Pawn on e2: e3 e4"));

        let response = console.handle_command("select e4").unwrap();
        assert!(response.contains("White Pawn e2 -> e4"));
        assert_eq!(console.handle_command("score").unwrap(), "White 1290 Black 1290\n");
        assert_eq!(console.game().active_color(), Color::Black);
    }

    #[test]
    fn test_console_reports_bad_input() {
        let config = GameConfig::default().with_computer(None);
        let mut console = ConsoleHandler::new(config).unwrap();
        assert!(console.handle_command("select z9").is_err());
        assert_eq!(console.handle_command("select e5").unwrap(), "ignored\n");
        assert_eq!(console.handle_command("dance").unwrap(), "unknown command: dance\n");
    }
}
