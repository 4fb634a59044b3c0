use anyhow::{Context, Result, anyhow, bail};
use friendassign_api::assignment::{AssignmentFilter, AssignmentId, Difficulty};
use friendassign_api::assignment_selector::AssignmentSelector;
use friendassign_api::auth::AuthProvider;
use friendassign_api::client::Client;
use friendassign_api::creds::Creds;
use friendassign_api::services::api_service::ApiService;
use friendassign_api::session::Session;
use friendassign_api::submission::SubmissionId;
use friendassign_flows::board::AssignmentBoard;
use friendassign_flows::detail::AssignmentDetail;
use friendassign_flows::editor::{AssignmentEditor, today};
use friendassign_flows::grading::PendingBoard;
use friendassign_flows::listing::paginate::Pagination;
use friendassign_flows::listing::pipeline::ListingPipeline;
use friendassign_flows::listing::sort::{Sort, SortDirection};
use friendassign_flows::listing::{ListQuery, Listing};
use friendassign_flows::notice::Outcome;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::prompt::TerminalConfirmer;

pub mod cli;
pub mod prompt;
pub mod render;

/// Signs in with credentials from the environment, if there are any. Without them every command
/// still runs, signed out.
pub async fn sign_in_from_env(auth: Option<&impl AuthProvider>) -> Result<()> {
    let Some(auth) = auth else {
        debug!("no identity provider configured, staying signed out");
        return Ok(());
    };
    match Creds::from_env() {
        Ok(creds) => {
            auth.sign_in(&creds)
                .await
                .with_context(|| format!("could not sign in as {}", creds.email()))?;
            Ok(())
        }
        Err(err) => {
            debug!(%err, "no credentials in the environment, staying signed out");
            Ok(())
        }
    }
}

pub async fn sign_up_from_env(auth: Option<&impl AuthProvider>, name: Option<String>) -> Result<()> {
    let auth = auth.ok_or_else(|| anyhow!("FRIENDASSIGN_AUTH_KEY is not set"))?;
    let creds = Creds::from_env().context("FRIENDASSIGN_EMAIL and FRIENDASSIGN_PASSWORD are required")?;
    let identity = auth.sign_up(&creds, name).await.context("could not sign up")?;
    info!(%identity, "account created");
    Ok(())
}

/// One line typed into `browse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseInput {
    Search(String),
    Difficulty(Option<Difficulty>),
    Sort(Sort),
    Page(usize),
    Quit,
}

impl BrowseInput {
    pub const HELP: &'static str = "Type to search. Commands: :difficulty <easy|medium|hard|all>, \
                                    :sort <title|difficulty|marks|none> [asc|desc], :page <n>, :quit";

    pub fn parse(line: &str) -> Result<Self> {
        let Some(command) = line.strip_prefix(':') else {
            return Ok(BrowseInput::Search(line.trim().to_owned()));
        };

        let mut words = command.split_whitespace();
        let input = match (words.next(), words.next(), words.next()) {
            (Some("q" | "quit"), None, None) => BrowseInput::Quit,
            (Some("difficulty"), Some("all"), None) => BrowseInput::Difficulty(None),
            (Some("difficulty"), Some(difficulty), None) => {
                BrowseInput::Difficulty(Some(difficulty.parse()?))
            }
            (Some("sort"), Some("none"), None) => BrowseInput::Sort(Sort::default()),
            (Some("sort"), Some(field), direction) => BrowseInput::Sort(Sort::by(
                field.parse()?,
                direction.map(str::parse).transpose()?.unwrap_or_default(),
            )),
            (Some("page"), Some(page), None) => {
                BrowseInput::Page(page.parse().with_context(|| format!("bad page \"{page}\""))?)
            }
            _ => bail!("unknown command \"{line}\""),
        };
        Ok(input)
    }
}

/// Runs one command against the API as whoever `session` says is signed in.
pub struct App<Service> {
    api: Client<Service>,
    session: Session,
    page_size: usize,
}

impl<Service: ApiService> App<Service> {
    pub fn new(api: Client<Service>, session: Session, page_size: usize) -> Self {
        Self {
            api,
            session,
            page_size,
        }
    }

    /// Runs `command`, printing whatever it lists, and returns what the user should be told.
    pub async fn run(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::SignUp { .. } => bail!("sign-up is handled before the API is used"),
            Command::List {
                difficulty,
                search,
                sort,
                desc,
                page,
            } => {
                let direction = if desc {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                };
                let sort = Sort {
                    field: sort,
                    direction,
                };
                self.list(ListQuery { difficulty, search }, sort, page).await
            }
            Command::Browse => self.browse().await,
            Command::Show { assignment } => self.show(&assignment).await,
            Command::Create {
                title,
                description,
                marks,
                thumbnail_url,
                difficulty,
                due_date,
            } => {
                let mut editor = AssignmentEditor::create(self.api.clone(), self.session.clone());
                let form = editor.form_mut();
                form.title = title;
                form.description = description;
                form.marks = marks;
                form.thumbnail_url = thumbnail_url;
                form.difficulty = difficulty;
                form.due_date = due_date.unwrap_or_else(today);
                Ok(editor.save().await)
            }
            Command::Edit {
                assignment,
                title,
                description,
                marks,
                thumbnail_url,
                difficulty,
                due_date,
            } => {
                let id = self.resolve(&assignment).await;
                let mut editor = match AssignmentEditor::load_for_edit(
                    self.api.clone(),
                    self.session.clone(),
                    &id,
                )
                .await
                {
                    Ok(editor) => editor,
                    Err(outcome) => return Ok(outcome),
                };
                let form = editor.form_mut();
                replace(&mut form.title, title);
                replace(&mut form.description, description);
                replace(&mut form.marks, marks);
                replace(&mut form.thumbnail_url, thumbnail_url);
                replace(&mut form.difficulty, difficulty);
                replace(&mut form.due_date, due_date);
                Ok(editor.save().await)
            }
            Command::Delete { assignment, yes } => {
                let id = self.resolve(&assignment).await;
                let mut board = AssignmentBoard::new(
                    self.api.clone(),
                    self.session.clone(),
                    self.listing()?,
                );
                Ok(board.delete(&id, &TerminalConfirmer::new(yes)).await)
            }
            Command::Submit {
                assignment,
                link,
                notes,
            } => {
                let id = self.resolve(&assignment).await;
                let mut detail = match AssignmentDetail::load(self.api.clone(), &id).await {
                    Ok(detail) => detail,
                    Err(outcome) => return Ok(outcome),
                };
                let opened = detail.open_submission_form(&self.session);
                let Some(form) = detail.form_mut() else {
                    return Ok(opened);
                };
                form.link = link;
                form.notes = notes;
                Ok(detail.submit(&self.session).await)
            }
            Command::Pending => {
                let mut board = PendingBoard::new(self.api.clone());
                let outcome = board.load().await;
                println!("{}", render::pending(&board.rows(&self.session)));
                Ok(outcome)
            }
            Command::Grade {
                submission,
                marks,
                feedback,
            } => {
                let mut board = PendingBoard::new(self.api.clone());
                let loaded = board.load().await;
                if loaded.notice().is_some() {
                    return Ok(loaded);
                }
                let id = SubmissionId::from(submission.as_str());
                let opened = board.open_grade_form(&self.session, &id);
                let Some(form) = board.form_mut() else {
                    return Ok(opened);
                };
                form.obtained_marks = marks;
                form.feedback = feedback;
                Ok(board.submit_grade(&self.session).await)
            }
        }
    }

    fn listing(&self) -> Result<Listing> {
        Ok(Listing::new(Pagination::new(self.page_size)?))
    }

    async fn list(&self, query: ListQuery, sort: Sort, page: usize) -> Result<Outcome> {
        let mut board = AssignmentBoard::new(
            self.api.clone(),
            self.session.clone(),
            self.listing()?.with_query(query).with_sort(sort),
        );
        let outcome = board.refresh().await;
        board.go_to_page(page);
        println!("{}", render::listing(&board.view_model()));
        Ok(outcome)
    }

    async fn show(&self, selector: &str) -> Result<Outcome> {
        let id = self.resolve(selector).await;
        match AssignmentDetail::load(self.api.clone(), &id).await {
            Ok(detail) => {
                println!("{}", render::card(detail.assignment()));
                Ok(Outcome::nothing())
            }
            Err(outcome) => Ok(outcome),
        }
    }

    /// Accepts an id or a title. Anything that matches neither is passed through as an id and
    /// left for the server to reject.
    async fn resolve(&self, selector: &str) -> AssignmentId {
        match self.api.list_assignments(&AssignmentFilter::default()).await {
            Ok(assignments) => AssignmentSelector::new(selector.to_owned())
                .select_from(&assignments)
                .map(|assignment| assignment.id().clone())
                .unwrap_or_else(|| AssignmentId::from(selector)),
            Err(err) => {
                warn!("could not list assignments to resolve \"{selector}\": {err:#}");
                AssignmentId::from(selector)
            }
        }
    }

    async fn browse(&self) -> Result<Outcome> {
        let cancel = CancellationToken::new();
        let mut pipeline = ListingPipeline::spawn(self.api.clone(), self.listing()?, &cancel);
        let mut views = pipeline.views();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{}", BrowseInput::HELP);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = lines.next_line() => {
                    let Some(line) = line.context("could not read stdin")? else { break };
                    match BrowseInput::parse(&line) {
                        Ok(BrowseInput::Search(search)) => pipeline.set_search(search),
                        Ok(BrowseInput::Difficulty(difficulty)) => pipeline.set_difficulty(difficulty),
                        Ok(BrowseInput::Sort(sort)) => pipeline.set_sort(sort),
                        Ok(BrowseInput::Page(page)) => pipeline.go_to_page(page),
                        Ok(BrowseInput::Quit) => break,
                        Err(err) => eprintln!("{err:#}\n{}", BrowseInput::HELP),
                    }
                }
                changed = views.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    println!("{}\n", render::listing(&view));
                }
                Some(notice) = pipeline.next_notice() => eprintln!("{}", render::notice(&notice)),
            }
        }

        pipeline.shutdown().await;
        Ok(Outcome::nothing())
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
