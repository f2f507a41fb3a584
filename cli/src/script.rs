// Scripted annotation sessions
// One command per line, e.g.
//
//   select 2 5 7     # characters 5..7 of article 第 2 條
//   invoke
//   show 2

use std::io::Write;

use lawmark_core::{
    Config, Container, ContainerId, LawDocument, MarkupRenderer, NativeSelection, PopupController,
    PopupState, Rect, SelectionBuffer, SelectionSurface,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select characters `start..end` of an article (end before start selects backwards)
    Select {
        article: String,
        start: usize,
        end: usize,
    },
    Clear,
    Apply,
    Remove,
    Invoke,
    Popup,
    Show(Option<String>),
}

fn parse_offset(word: Option<&str>, what: &str) -> Result<usize, String> {
    let word = word.ok_or_else(|| format!("missing {what} offset"))?;
    word.parse()
        .map_err(|_| format!("invalid {what} offset '{word}'"))
}

/// Parse one script line; blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.split('#').next().unwrap_or("").trim();
    let mut words = line.split_whitespace();
    let Some(keyword) = words.next() else {
        return Ok(None);
    };

    let command = match keyword {
        "select" => {
            let article = words
                .next()
                .ok_or_else(|| "missing article".to_string())?
                .to_string();
            let start = parse_offset(words.next(), "start")?;
            let end = parse_offset(words.next(), "end")?;
            Command::Select {
                article,
                start,
                end,
            }
        }
        "clear" => Command::Clear,
        "apply" => Command::Apply,
        "remove" => Command::Remove,
        "invoke" => Command::Invoke,
        "popup" => Command::Popup,
        "show" => Command::Show(words.next().map(str::to_string)),
        other => return Err(format!("unknown command '{other}'")),
    };

    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }
    Ok(Some(command))
}

/// Native selection for `start..end`, reported the way a surface would:
/// the anchor where the drag began and the focus where it ended.
fn native_selection(
    container: &Container,
    start: usize,
    end: usize,
    rect: Rect,
) -> Option<NativeSelection> {
    let (anchor, focus) = if start < end {
        (container.point_at(start)?, container.point_before(end)?)
    } else if start > end {
        (container.point_before(start)?, container.point_at(end)?)
    } else {
        let point = container.point_at(start)?;
        (point, point)
    };
    Some(NativeSelection {
        anchor,
        focus,
        rect,
    })
}

fn describe(state: PopupState) -> String {
    match (state.label(), state.rect()) {
        (Some(label), Some(rect)) => format!(
            "popup: {label} @ {},{} {}x{}",
            rect.x, rect.y, rect.width, rect.height
        ),
        _ => "popup: hidden".to_string(),
    }
}

pub struct Session {
    document: LawDocument,
    surface: SelectionBuffer,
    popup: PopupController,
    renderer: MarkupRenderer,
}

impl Session {
    pub fn new(document: LawDocument, config: &Config) -> Self {
        Session {
            document,
            surface: SelectionBuffer::new(),
            popup: PopupController::with_config(config),
            renderer: MarkupRenderer::from_config(config),
        }
    }

    pub fn document(&self) -> &LawDocument {
        &self.document
    }

    fn article(&self, query: &str) -> Result<ContainerId, String> {
        self.document
            .find_article(query)
            .map(|(id, _)| id)
            .ok_or_else(|| format!("no article '{query}'"))
    }

    fn print_article(&self, out: &mut dyn Write, id: ContainerId) -> Result<(), String> {
        let article = &self.document.articles()[id.0 as usize];
        write!(
            out,
            "{}",
            self.renderer.article(&article.label, &article.container)
        )
        .map_err(|e| e.to_string())
    }

    pub fn execute(&mut self, command: Command, out: &mut dyn Write) -> Result<(), String> {
        match command {
            Command::Select {
                article,
                start,
                end,
            } => {
                let id = self.article(&article)?;
                let container = self
                    .document
                    .container(id)
                    .ok_or_else(|| format!("no article '{article}'"))?;
                let (lo, hi) = (start.min(end), start.max(end));
                let rect = Rect::new(lo as i32, id.0 as i32, (hi - lo) as i32, 1);
                let selection = native_selection(container, start, end, rect).ok_or_else(|| {
                    format!(
                        "offsets {start}..{end} outside article of length {}",
                        container.char_len()
                    )
                })?;
                self.surface.select(selection);
                let state = self.popup.on_selection_changed(&self.document, &self.surface);
                writeln!(out, "{}", describe(state)).map_err(|e| e.to_string())
            }
            Command::Clear => {
                self.surface.clear_selection();
                let state = self.popup.on_selection_changed(&self.document, &self.surface);
                writeln!(out, "{}", describe(state)).map_err(|e| e.to_string())
            }
            Command::Popup => {
                writeln!(out, "{}", describe(self.popup.state())).map_err(|e| e.to_string())
            }
            Command::Apply | Command::Remove | Command::Invoke => {
                let changed = match command {
                    Command::Apply => self.popup.apply(
                        &mut self.document,
                        &mut self.surface,
                        &mut self.renderer,
                    ),
                    Command::Remove => self.popup.remove(
                        &mut self.document,
                        &mut self.surface,
                        &mut self.renderer,
                    ),
                    _ => self.popup.invoke(
                        &mut self.document,
                        &mut self.surface,
                        &mut self.renderer,
                    ),
                }
                .map_err(|e| e.to_string())?;
                match changed {
                    Some(id) => self.print_article(out, id),
                    None => writeln!(out, "nothing selected").map_err(|e| e.to_string()),
                }
            }
            Command::Show(None) => write!(out, "{}", self.renderer.document(&self.document))
                .map_err(|e| e.to_string()),
            Command::Show(Some(article)) => {
                let id = self.article(&article)?;
                self.print_article(out, id)
            }
        }
    }
}

/// Run every line of `script`; stops at the first failing line.
pub fn run_script(session: &mut Session, script: &str, out: &mut dyn Write) -> Result<(), String> {
    for (number, line) in script.lines().enumerate() {
        let result = parse_line(line).and_then(|command| match command {
            Some(command) => session.execute(command, out),
            None => Ok(()),
        });
        if let Err(e) = result {
            return Err(format!("line {}: {}", number + 1, e));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let document = LawDocument::from_texts("測試法", ["ABCDEFGH", "中華民國之主權屬於國民全體。"]);
        Session::new(document, &Config::default())
    }

    fn run(session: &mut Session, script: &str) -> String {
        let mut out = Vec::new();
        run_script(session, script, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("# comment"), Ok(None));
        assert_eq!(
            parse_line("select 2 5 7 # 主權"),
            Ok(Some(Command::Select {
                article: "2".into(),
                start: 5,
                end: 7
            }))
        );
        assert_eq!(parse_line("show"), Ok(Some(Command::Show(None))));
        assert_eq!(
            parse_line("show 3"),
            Ok(Some(Command::Show(Some("3".into()))))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("highlight").is_err());
        assert!(parse_line("select 1 x 3").is_err());
        assert!(parse_line("select 1 2").is_err());
        assert!(parse_line("apply now").is_err());
    }

    #[test]
    fn test_highlight_and_partial_remove() {
        let mut session = session();
        let out = run(
            &mut session,
            "select 1 1 4\ninvoke\nselect 1 2 3\npopup\ninvoke\n",
        );
        assert_eq!(
            out,
            "popup: Highlight @ 1,0 3x1\n\
             第 1 條\nA[[BCD]]EFGH\n\
             popup: Remove highlight @ 2,0 1x1\n\
             popup: Remove highlight @ 2,0 1x1\n\
             第 1 條\nA[[B]]C[[D]]EFGH\n"
        );
    }

    #[test]
    fn test_backwards_selection() {
        let mut session = session();
        let out = run(&mut session, "select 2 7 5\napply\n");
        assert_eq!(
            out,
            "popup: Highlight @ 5,1 2x1\n第 2 條\n中華民國之[[主權]]屬於國民全體。\n"
        );
    }

    #[test]
    fn test_collapsed_selection_hides_popup() {
        let mut session = session();
        let out = run(&mut session, "select 1 3 3\ninvoke\n");
        assert_eq!(out, "popup: hidden\nnothing selected\n");
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let mut session = session();
        let mut out = Vec::new();
        let err = run_script(&mut session, "popup\nselect 9 0 1\n", &mut out).unwrap_err();
        assert_eq!(err, "line 2: no article '9'");

        let err = run_script(&mut session, "select 1 0 99\n", &mut out).unwrap_err();
        assert_eq!(err, "line 1: offsets 0..99 outside article of length 8");
    }
}
