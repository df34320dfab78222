//! Line-based terminal front end.
//!
//! Each line typed on stdin is one input: an empty line is the space key,
//! `<`/`>` are the arrow keys and `:`-prefixed lines are commands. Chunks are
//! redrawn in place on stdout.

use crate::CliArgs;
use crate::http::{HttpOcrEngine, ModelBackend};
use anyhow::{Context, Result, anyhow};
use std::path::Path;
use swiftleaf_core::chunk::Chunk;
use swiftleaf_core::chunker::{Chunker, ChunkerConfig};
use swiftleaf_core::clock::{format_day, local_date, now_millis, today};
use swiftleaf_core::config::{AppConfig, serialize_config};
use swiftleaf_core::library::{CALENDAR_DAYS, FileStore, Library, SavedDocument, document_id, intensity};
use swiftleaf_core::services::{LlmSegmenter, OcrRequest};
use swiftleaf_core::session::shortcuts::{InputFocus, KeyInput, Modifiers};
use swiftleaf_core::session::{ReadingSession, SessionCommand, SessionEvent, SessionSignal, SessionSnapshot};
use swiftleaf_core::study::{Quiz, StudyTools};
use swiftleaf_core::timer::{Timer, TokioTimer};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::{debug, info, warn};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const HISTORY_ROWS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    Key(KeyInput),
    AdjustWpm { increase: bool },
    SetWpm(u32),
    /// Zero-based chunk index.
    Seek(usize),
    /// One-based position in the bookmark list.
    JumpToBookmark(usize),
    AddBookmark(Option<String>),
    ListBookmarks,
    /// One-based position in the bookmark list.
    RemoveBookmark(usize),
    ListDocuments,
    FindDocuments(String),
    /// Document id or a unique prefix of one.
    ForgetDocument(String),
    ShowGoal,
    SetGoal(u64),
    ShowHistory,
    Summary,
    ExplainSimpler,
    Ask(String),
    Vocabulary,
    Flashcards,
    Quiz,
    /// Zero-based option per question, in order.
    Answer(Vec<usize>),
    ShowConfig,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> InputAction {
    let trimmed = line.trim();
    match trimmed {
        "" => return InputAction::Key(KeyInput::new(" ")),
        "<" => return InputAction::Key(KeyInput::new("ArrowLeft")),
        ">" => return InputAction::Key(KeyInput::new("ArrowRight")),
        "r" => return InputAction::Key(KeyInput::new("r")),
        "R" => {
            return InputAction::Key(KeyInput::with_modifiers(
                "R",
                Modifiers {
                    shift: true,
                    ..Modifiers::default()
                },
            ));
        }
        "+" => return InputAction::AdjustWpm { increase: true },
        "-" => return InputAction::AdjustWpm { increase: false },
        "q" | ":q" | ":quit" => return InputAction::Quit,
        "?" | ":help" => return InputAction::Help,
        _ => {}
    }

    if trimmed == "b" {
        return InputAction::AddBookmark(None);
    }
    if let Some(note) = trimmed.strip_prefix("b ") {
        let note = note.trim();
        return InputAction::AddBookmark((!note.is_empty()).then(|| note.to_string()));
    }

    let Some(command) = trimmed.strip_prefix(':') else {
        return InputAction::Unknown(trimmed.to_string());
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    let unknown = || InputAction::Unknown(trimmed.to_string());
    match (name, arg) {
        ("wpm", arg) => arg.parse().map(InputAction::SetWpm).unwrap_or_else(|_| unknown()),
        ("seek", arg) => arg
            .parse::<usize>()
            .map(|n| InputAction::Seek(n.saturating_sub(1)))
            .unwrap_or_else(|_| unknown()),
        ("jump", arg) => match arg.parse::<usize>() {
            Ok(n) if n > 0 => InputAction::JumpToBookmark(n),
            _ => unknown(),
        },
        ("marks", "") => InputAction::ListBookmarks,
        ("unmark", arg) => match arg.parse::<usize>() {
            Ok(n) if n > 0 => InputAction::RemoveBookmark(n),
            _ => unknown(),
        },
        ("library", "") => InputAction::ListDocuments,
        ("find", query) if !query.is_empty() => InputAction::FindDocuments(query.to_string()),
        ("forget", id) if !id.is_empty() => InputAction::ForgetDocument(id.to_string()),
        ("goal", "") => InputAction::ShowGoal,
        ("goal", arg) => arg.parse().map(InputAction::SetGoal).unwrap_or_else(|_| unknown()),
        ("history", "") => InputAction::ShowHistory,
        ("summary", "") => InputAction::Summary,
        ("simple", "") => InputAction::ExplainSimpler,
        ("vocab", "") => InputAction::Vocabulary,
        ("cards", "") => InputAction::Flashcards,
        ("quiz", "") => InputAction::Quiz,
        ("answer", arg) => parse_answers(arg).map(InputAction::Answer).unwrap_or_else(unknown),
        ("config", "") => InputAction::ShowConfig,
        ("ask", question) if !question.is_empty() => InputAction::Ask(question.to_string()),
        _ => unknown(),
    }
}

/// Letters (`a` is the first option) or one-based numbers, separated by
/// whitespace or commas.
fn parse_answers(arg: &str) -> Option<Vec<usize>> {
    let answers = arg
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            let mut chars = token.chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_ascii_lowercase() => {
                    Some(usize::from(letter as u8 - b'a'))
                }
                _ => token.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1),
            }
        })
        .collect::<Option<Vec<_>>>()?;
    (!answers.is_empty()).then_some(answers)
}

/// The chunk's words with the focus word in bold.
pub fn render_chunk(chunk: &Chunk) -> String {
    chunk
        .words
        .iter()
        .enumerate()
        .map(|(idx, word)| {
            if idx == chunk.focus_index {
                format!("{BOLD}{word}{RESET}")
            } else {
                word.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let stats = &snapshot.stats;
    let state = if snapshot.is_playing { "playing" } else { "paused" };
    format!(
        "[{state} {wpm} wpm | {pos}/{count} | {progress:.0}% | {minutes:.1} min left]",
        wpm = snapshot.wpm,
        pos = (stats.chunk_index + 1).min(stats.chunk_count),
        count = stats.chunk_count,
        progress = stats.progress_percent,
        minutes = stats.minutes_remaining,
    )
}

const HELP: &str = "\
Enter play/pause   < back   > forward   r restart   + / - speed
b [note] bookmark  :marks  :jump N  :unmark N  :seek N  :wpm N
:library  :find TEXT  :forget ID  :goal [N]  :history  :config
:summary  :simple  :vocab  :cards  :quiz  :answer a b ..  :ask QUESTION  q quit";

struct Screen {
    out: Stdout,
}

impl Screen {
    fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }

    /// Overwrite the current line.
    async fn draw(&mut self, snapshot: &SessionSnapshot) -> Result<()> {
        let body = snapshot
            .current_chunk
            .as_ref()
            .map(render_chunk)
            .unwrap_or_default();
        let line = format!("\r\x1b[2K{body}   {}", render_status(snapshot));
        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await?;
        Ok(())
    }

    async fn message(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(format!("\r\x1b[2K{text}\n").as_bytes())
            .await?;
        self.out.flush().await?;
        Ok(())
    }
}

type ReaderSegmenter = LlmSegmenter<ModelBackend>;

struct Reader<T> {
    session: ReadingSession<T>,
    study: StudyTools<ModelBackend>,
    library: Library<FileStore>,
    document: SavedDocument,
    config: AppConfig,
    pending_quiz: Option<Quiz>,
    screen: Screen,
}

pub async fn run(args: CliArgs, config: AppConfig) -> Result<()> {
    let backend = ModelBackend::from_config(&config)?;
    let chunker = Chunker::new(
        LlmSegmenter::new(backend.clone()),
        ChunkerConfig::from(&config),
    );
    let (timer, mut ticks) = TokioTimer::channel();
    let mut session = ReadingSession::new(timer, &config);
    let mut screen = Screen::new();

    screen.message("Preparing text...").await?;
    load_source(&args.path, &config, &mut session, &chunker, &mut screen).await?;

    let library = Library::open(&config.data_dir);
    let saved_wpm = library
        .documents
        .get(&document_id(session.source_text()))?
        .and_then(|doc| doc.wpm);
    if let Some(wpm) = args.wpm.or(saved_wpm) {
        session.apply_command(SessionCommand::SetWpm { wpm });
    }
    let document = library
        .documents
        .save_text(session.source_text(), session.wpm(), now_millis())?;
    info!(
        id = %document.id,
        title = %document.title,
        chunks = session.chunks().len(),
        wpm = session.wpm(),
        "Ready to read"
    );

    let mut reader = Reader {
        session,
        study: StudyTools::new(backend),
        library,
        document,
        config,
        pending_quiz: None,
        screen,
    };
    let title = reader.document.title.clone();
    reader.screen.message(&format!("{title}  (? for help)")).await?;
    let snapshot = reader.session.snapshot();
    reader.screen.draw(&snapshot).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if !reader.handle_input(parse_input(&line)).await? {
                    break;
                }
            }
            Some(tick) = ticks.recv() => {
                let event = reader
                    .session
                    .apply_command(SessionCommand::TimerFired { generation: tick.generation });
                reader.handle_event(event).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
        }
    }

    reader.close().await
}

async fn load_source<T: Timer>(
    path: &Path,
    config: &AppConfig,
    session: &mut ReadingSession<T>,
    chunker: &Chunker<ReaderSegmenter>,
    screen: &mut Screen,
) -> Result<()> {
    let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

    if !is_image {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        if !session.load_text(chunker, &text).await? {
            return Err(anyhow!("parsing was superseded before it finished"));
        }
        return Ok(());
    }

    let engine = HttpOcrEngine::from_config(config)?
        .ok_or_else(|| anyhow!("image input needs [ocr] endpoint in the config"))?;
    let image = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let request = OcrRequest {
        image,
        language: config.ocr_language.clone(),
    };
    let (loaded, warning) = session
        .load_image(&engine, chunker, request, &|fraction| {
            debug!(percent = (fraction * 100.0).round(), "Recognition progress");
        })
        .await?;
    if let Some(warning) = warning {
        screen.message(&format!("Warning: {warning}")).await?;
    }
    if !loaded {
        return Err(anyhow!("parsing was superseded before it finished"));
    }
    Ok(())
}

impl<T: Timer> Reader<T> {
    /// `false` ends the loop.
    async fn handle_input(&mut self, action: InputAction) -> Result<bool> {
        let command = match action {
            InputAction::Quit => return Ok(false),
            InputAction::Key(key) => SessionCommand::KeyPressed {
                key,
                focus: InputFocus::Reader,
            },
            InputAction::AdjustWpm { increase } => SessionCommand::AdjustWpm { increase },
            InputAction::SetWpm(wpm) => SessionCommand::SetWpm { wpm },
            InputAction::Seek(index) => SessionCommand::Seek { index },
            InputAction::JumpToBookmark(position) => {
                let bookmarks = self.library.documents.bookmarks(&self.document.id)?;
                match bookmarks.get(position - 1) {
                    Some(bookmark) => SessionCommand::Seek {
                        index: bookmark.chunk_index,
                    },
                    None => {
                        self.screen
                            .message(&format!("No bookmark #{position}"))
                            .await?;
                        SessionCommand::GetSnapshot
                    }
                }
            }
            other => {
                self.run_tool(other).await?;
                SessionCommand::GetSnapshot
            }
        };
        let event = self.session.apply_command(command);
        self.handle_event(event).await?;
        Ok(true)
    }

    /// Commands that print something instead of steering playback.
    async fn run_tool(&mut self, action: InputAction) -> Result<()> {
        match action {
            InputAction::AddBookmark(note) => {
                let index = self.session.current_index();
                let added = self.library.documents.add_bookmark(
                    &self.document.id,
                    index,
                    note.as_deref(),
                    now_millis(),
                )?;
                let text = match added {
                    Some(_) => format!("Bookmarked chunk {}", index + 1),
                    None => "Document is no longer in the library".to_string(),
                };
                self.screen.message(&text).await?;
            }
            InputAction::ListBookmarks => {
                let bookmarks = self.library.documents.bookmarks(&self.document.id)?;
                if bookmarks.is_empty() {
                    self.screen.message("No bookmarks").await?;
                }
                for (position, bookmark) in bookmarks.iter().enumerate() {
                    let note = bookmark.note.as_deref().unwrap_or("");
                    self.screen
                        .message(&format!(
                            "{:>3}. chunk {} {note}",
                            position + 1,
                            bookmark.chunk_index + 1
                        ))
                        .await?;
                }
            }
            InputAction::RemoveBookmark(position) => {
                let bookmarks = self.library.documents.bookmarks(&self.document.id)?;
                let removed = match bookmarks.get(position - 1) {
                    Some(bookmark) => self
                        .library
                        .documents
                        .delete_bookmark(&self.document.id, &bookmark.id)?,
                    None => false,
                };
                let text = if removed {
                    format!("Removed bookmark #{position}")
                } else {
                    format!("No bookmark #{position}")
                };
                self.screen.message(&text).await?;
            }
            InputAction::ListDocuments => {
                let docs = self.library.documents.list()?;
                self.show_documents(&docs).await?;
            }
            InputAction::FindDocuments(query) => {
                let docs = self.library.documents.search(&query)?;
                self.show_documents(&docs).await?;
            }
            InputAction::ForgetDocument(prefix) => {
                let matches: Vec<SavedDocument> = self
                    .library
                    .documents
                    .list()?
                    .into_iter()
                    .filter(|doc| doc.id.starts_with(&prefix))
                    .collect();
                let text = match matches.as_slice() {
                    [] => format!("No document {prefix}"),
                    [doc] if doc.id == self.document.id => {
                        "Cannot forget the open document".to_string()
                    }
                    [doc] => {
                        if self.library.documents.delete(&doc.id)? {
                            format!("Forgot {}", doc.title)
                        } else {
                            format!("No document {prefix}")
                        }
                    }
                    _ => format!("{prefix} matches {} documents", matches.len()),
                };
                self.screen.message(&text).await?;
            }
            InputAction::ShowGoal => {
                let goal = self.library.goals.load()?;
                let day = today();
                self.screen
                    .message(&format!(
                        "Today {}/{} words ({:.0}%), streak {} (best {})",
                        goal.words_on(day),
                        goal.daily_word_target,
                        goal.progress_percent(day),
                        goal.streak_on(day),
                        goal.longest_streak
                    ))
                    .await?;
            }
            InputAction::SetGoal(target) => {
                let text = match self.library.goals.set_daily_target(target) {
                    Ok(goal) => format!("Daily goal set to {} words", goal.daily_word_target),
                    Err(err) => format!("{err:#}"),
                };
                self.screen.message(&text).await?;
            }
            InputAction::ShowHistory => self.show_history().await?,
            InputAction::ShowConfig => {
                let text = serialize_config(&self.config)?;
                self.screen.message(text.trim_end()).await?;
            }
            InputAction::Answer(answers) => self.grade_quiz(&answers).await?,
            InputAction::Summary
            | InputAction::ExplainSimpler
            | InputAction::Ask(_)
            | InputAction::Vocabulary
            | InputAction::Flashcards
            | InputAction::Quiz => self.run_study(action).await?,
            InputAction::Help => self.screen.message(HELP).await?,
            InputAction::Unknown(raw) => {
                self.screen
                    .message(&format!("Unknown input {raw:?}; ? for help"))
                    .await?;
            }
            InputAction::Key(_)
            | InputAction::AdjustWpm { .. }
            | InputAction::SetWpm(_)
            | InputAction::Seek(_)
            | InputAction::JumpToBookmark(_)
            | InputAction::Quit => {}
        }
        Ok(())
    }

    async fn show_history(&mut self) -> Result<()> {
        let history = &self.library.history;
        let summary = history.summary()?;
        let heat: String = history
            .calendar(today(), CALENDAR_DAYS)?
            .iter()
            .map(|day| {
                let words = day.entry.as_ref().map_or(0, |entry| entry.words_read);
                [' ', '.', ':', '*', '#'][usize::from(intensity(words))]
            })
            .collect();
        let mut lines = vec![
            format!(
                "{} words, {} documents, {} wpm average",
                summary.total_words, summary.total_documents, summary.avg_wpm
            ),
            format!("[{heat}]"),
        ];
        for entry in history.recent(HISTORY_ROWS)? {
            lines.push(format!(
                "  {}: {} words at {:.0} wpm",
                format_day(entry.day),
                entry.words_read,
                entry.avg_wpm
            ));
        }
        self.screen.message(&lines.join("\n")).await
    }

    async fn show_documents(&mut self, docs: &[SavedDocument]) -> Result<()> {
        if docs.is_empty() {
            return self.screen.message("No documents").await;
        }
        let lines: Vec<String> = docs
            .iter()
            .map(|doc| {
                let marker = if doc.id == self.document.id { '*' } else { ' ' };
                let done = if doc.completed_at.is_some() { " (finished)" } else { "" };
                let last_read = doc
                    .last_read_at
                    .and_then(local_date)
                    .map(format_day)
                    .unwrap_or_default();
                format!("{marker} {}  {last_read:<14} {}{done}", short_id(&doc.id), doc.title)
            })
            .collect();
        self.screen.message(&lines.join("\n")).await
    }

    async fn grade_quiz(&mut self, answers: &[usize]) -> Result<()> {
        let Some(quiz) = self.pending_quiz.take() else {
            return self.screen.message("No quiz in progress; :quiz starts one").await;
        };
        let score = quiz.score(answers);
        let mut lines = vec![format!("Score {score}/{}", quiz.questions.len())];
        for (idx, question) in quiz.questions.iter().enumerate() {
            if answers.get(idx) != Some(&question.correct_index) {
                let correct = question
                    .options
                    .get(question.correct_index)
                    .map_or("", String::as_str);
                lines.push(format!(
                    "  {}. {} -> {}",
                    idx + 1,
                    question.question,
                    correct
                ));
            }
        }
        self.screen.message(&lines.join("\n")).await
    }

    async fn run_study(&mut self, action: InputAction) -> Result<()> {
        if !self.study.is_available() {
            return self
                .screen
                .message("Study tools need a [service] base_url in the config")
                .await;
        }
        self.session.apply_command(SessionCommand::Pause);
        self.screen.message("Thinking...").await?;

        let text = self.session.source_text().to_string();
        let reply = match action {
            InputAction::Summary => self.study.summary(&text).await,
            InputAction::ExplainSimpler => {
                let passage = self
                    .session
                    .current_chunk()
                    .map(Chunk::text)
                    .unwrap_or(text);
                self.study.explain_simpler(&passage).await
            }
            InputAction::Ask(question) => self.study.answer_question(&question, &text).await,
            InputAction::Vocabulary => self.study.vocabulary(&text).await.map(|words| {
                words
                    .iter()
                    .map(|word| format!("{} ({:?}): {}", word.word, word.difficulty, word.definition))
                    .collect::<Vec<_>>()
                    .join("\n")
            }),
            InputAction::Flashcards => self
                .study
                .flashcards(&text, &self.document.id)
                .await
                .map(|cards| {
                    cards
                        .iter()
                        .enumerate()
                        .map(|(idx, card)| format!("{}. {}\n   {}", idx + 1, card.question, card.answer))
                        .collect::<Vec<_>>()
                        .join("\n")
                }),
            InputAction::Quiz => self
                .study
                .quiz(&text, &self.document.id, Some(&self.document.title))
                .await
                .map(|quiz| {
                    let rendered = render_quiz(&quiz);
                    self.pending_quiz = Some(quiz);
                    rendered
                }),
            _ => return Ok(()),
        };
        match reply {
            Ok(reply) => self.screen.message(&reply).await,
            Err(err) => {
                warn!("Study request failed: {err}");
                self.screen.message(&format!("{err}")).await
            }
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) -> Result<()> {
        debug!(action = event.action, "Session event");
        self.screen.draw(&event.snapshot).await?;
        if event.signal == Some(SessionSignal::ReadingComplete) {
            self.record_completion().await?;
        }
        Ok(())
    }

    /// Credits only the words that were on screen for their full display time.
    async fn record_completion(&mut self) -> Result<()> {
        let words = self.session.take_words_shown() as u64;
        if words == 0 {
            return Ok(());
        }
        let day = today();
        let first_completion = self
            .library
            .documents
            .get(&self.document.id)?
            .is_none_or(|doc| doc.completed_at.is_none());

        let goal = self.library.goals.record_words(words, day)?;
        self.library
            .history
            .record(day, words, self.session.wpm(), first_completion)?;
        self.library
            .documents
            .mark_completed(&self.document.id, now_millis())?;

        let mut text = format!(
            "Finished {words} words. Today {}/{} words, streak {}",
            goal.words_read_today, goal.daily_word_target, goal.current_streak
        );
        if goal.is_reached(day) {
            text.push_str(" - daily goal reached");
        }
        self.screen.message(&text).await
    }

    async fn close(mut self) -> Result<()> {
        let wpm = self.session.wpm();
        if let Err(err) = self.library.documents.set_wpm(&self.document.id, wpm) {
            warn!("Failed to save reading speed: {err:#}");
        }
        self.session.apply_command(SessionCommand::Close);
        self.screen.message("").await?;
        info!(wpm, "Closed reader");
        Ok(())
    }
}

fn render_quiz(quiz: &Quiz) -> String {
    let mut lines = vec![quiz.title.clone()];
    for (idx, question) in quiz.questions.iter().enumerate() {
        lines.push(format!("{}. {}", idx + 1, question.question));
        for (option_idx, option) in question.options.iter().enumerate() {
            let letter = char::from(b'a' + (option_idx % 26) as u8);
            lines.push(format!("   {letter}) {option}"));
        }
    }
    lines.push(":answer with one letter per question".to_string());
    lines.join("\n")
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
