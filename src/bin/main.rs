use anyhow::{Context, Error};
use chrono::NaiveDateTime;
use nariz_encantado::{
    config,
    endpoints::{admin, auth, events, financial, users},
    guard::Decision,
    storage::FileStorage,
    ApiClient, Config, CredentialStore, DocumentType, NewEvent,
    NewFinancialRecord, NewUser, Page, RecordType, RouteTable,
    SessionContext, Upload, User,
};
use std::{path::PathBuf, sync::Arc};
use structopt::StructOpt;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::from_args();

    let config = args.config()?;
    let state_file = args.state_file()?;
    log::debug!(
        "Using {} with the session stored in {}",
        config.base_url,
        state_file.display()
    );

    let storage = Arc::new(FileStorage::new(state_file));
    let api = ApiClient::new(&config, CredentialStore::new(storage))?;
    let mut session = SessionContext::restore(api, &config).await;

    run(&mut session, args.cmd).await
}

async fn run(session: &mut SessionContext, cmd: Command) -> Result<(), Error> {
    match cmd {
        Command::Login {
            identifier,
            password,
        } => {
            let user = session.login(&identifier, &password).await?;
            println!("Logged in as {}", describe(&user));
        },
        Command::Logout => {
            session.logout();
            println!("Logged out");
        },
        Command::Whoami => match session.user() {
            Some(user) => println!("{}", describe(user)),
            None => println!("Not logged in"),
        },
        Command::Register(details) => {
            let user = auth::register(session.api(), &details.into()).await?;
            println!("Registered {}, you can now log in", describe(&user));
        },
        Command::ResetPassword { email } => {
            let msg = auth::reset_password(session.api(), &email).await?;
            println!("{}", msg.message);
        },
        Command::Events(cmd) => run_events(session, cmd).await?,
        Command::MyEvents => {
            for entry in users::my_events(session.api()).await? {
                println!(
                    "{} {} @ {} (registered {})",
                    entry.event.date_time,
                    entry.event.name,
                    entry.event.location,
                    entry.registered_at
                );
            }
        },
        Command::Documents(cmd) => run_documents(session, cmd).await?,
        Command::Admin(cmd) => run_admin(session, cmd).await?,
        Command::Financial(cmd) => run_financial(session, cmd).await?,
        Command::CanVisit { path } => {
            match RouteTable::default().navigate(session.state(), &path) {
                Decision::Allow => println!("allow"),
                Decision::RedirectTo(target) => {
                    println!("redirect to {}", target)
                },
            }
        },
    }

    Ok(())
}

async fn run_events(
    session: &SessionContext,
    cmd: EventsCommand,
) -> Result<(), Error> {
    let api = session.api();

    match cmd {
        EventsCommand::List { skip, limit } => {
            for event in events::list(api, Page::new(skip, limit)).await? {
                println!(
                    "#{} {} {} @ {} ({}/{} spots left)",
                    event.id,
                    event.date_time,
                    event.name,
                    event.location,
                    event.available_spots,
                    event.total_spots
                );
            }
        },
        EventsCommand::Show { id } => {
            let event = events::get(api, id).await?;
            println!("{:#?}", event);
        },
        EventsCommand::Register { id } => {
            let registration = events::register(api, id).await?;
            println!(
                "Registered for event #{} at {}",
                registration.event_id, registration.registered_at
            );
        },
    }

    Ok(())
}

async fn run_documents(
    session: &SessionContext,
    cmd: DocumentsCommand,
) -> Result<(), Error> {
    match cmd {
        DocumentsCommand::List => {
            let documents = users::my_documents(session.api()).await?;

            for ty in DocumentType::ALL.iter() {
                match documents.iter().find(|doc| doc.document_type == *ty) {
                    Some(doc) => println!("{}: uploaded {}", ty, doc.uploaded_at),
                    None => println!("{}: missing", ty),
                }
            }
        },
        DocumentsCommand::Upload {
            document_type,
            path,
        } => {
            let file = Upload::from_path(&path).await?;
            let doc =
                users::upload_document(session.api(), document_type, file)
                    .await?;
            println!("Uploaded {} as document #{}", doc.document_type, doc.id);
        },
    }

    Ok(())
}

async fn run_admin(
    session: &SessionContext,
    cmd: AdminCommand,
) -> Result<(), Error> {
    let api = session.api();

    match cmd {
        AdminCommand::Users => {
            for user in admin::list_users(api).await? {
                let role = if user.is_admin { "admin" } else { "volunteer" };
                println!("#{} {} ({})", user.id, describe(&user), role);
            }
        },
        AdminCommand::Create(details) => {
            let user = admin::create_admin(api, &details.into()).await?;
            println!("Created admin #{} {}", user.id, describe(&user));
        },
        AdminCommand::Promote { id } => {
            let user = admin::set_role(api, id, true).await?;
            println!("{} is now an admin", describe(&user));
        },
        AdminCommand::Demote { id } => {
            let user = admin::set_role(api, id, false).await?;
            println!("{} is no longer an admin", describe(&user));
        },
        AdminCommand::Events(cmd) => run_admin_events(api, cmd).await?,
    }

    Ok(())
}

async fn run_admin_events(
    api: &ApiClient,
    cmd: AdminEventsCommand,
) -> Result<(), Error> {
    match cmd {
        AdminEventsCommand::Create(details) => {
            let event = events::create(api, &details.into()).await?;
            println!("Created event #{}", event.id);
        },
        AdminEventsCommand::Update { id, details } => {
            let event = events::update(api, id, &details.into()).await?;
            println!("Updated event #{}", event.id);
        },
        AdminEventsCommand::Delete { id } => {
            events::delete(api, id).await?;
            println!("Deleted event #{}", id);
        },
        AdminEventsCommand::Image { id, path } => {
            let image = Upload::from_path(&path).await?;
            let event = events::upload_image(api, id, image).await?;
            println!(
                "Event #{} now uses {}",
                event.id,
                event.image_path.unwrap_or_default()
            );
        },
    }

    Ok(())
}

async fn run_financial(
    session: &SessionContext,
    cmd: FinancialCommand,
) -> Result<(), Error> {
    let api = session.api();

    match cmd {
        FinancialCommand::List { skip, limit } => {
            for record in financial::list(api, Page::new(skip, limit)).await? {
                println!(
                    "#{} {} {} {:.2} {}{}",
                    record.id,
                    record.record_date.date(),
                    record.record_type,
                    record.amount,
                    record.description.unwrap_or_default(),
                    if record.document_path.is_some() {
                        " [receipt]"
                    } else {
                        ""
                    }
                );
            }
        },
        FinancialCommand::Add {
            record_type,
            amount,
            date,
            description,
        } => {
            let record = NewFinancialRecord {
                record_type,
                amount,
                description,
                record_date: date,
            };
            let created = financial::create(api, &record).await?;
            println!("Recorded #{}", created.id);
        },
        FinancialCommand::Attach { id, path } => {
            let proof = Upload::from_path(&path).await?;
            financial::upload_proof(api, id, proof).await?;
            println!("Attached {} to record #{}", path.display(), id);
        },
        FinancialCommand::Summary => {
            for month in financial::summary(api).await? {
                println!(
                    "{}: +{:.2} -{:.2} = {:.2}",
                    month.month, month.income, month.expense, month.balance
                );
            }
        },
    }

    Ok(())
}

fn describe(user: &User) -> String {
    match user.clown_name() {
        Some(clown) => format!("{} \"{}\" <{}>", user.full_name, clown, user.email),
        None => format!("{} <{}>", user.full_name, user.email),
    }
}

/// Accept either a full timestamp or just a date.
fn parse_date(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    match s.parse::<NaiveDateTime>() {
        Ok(timestamp) => Ok(timestamp),
        Err(_) => NaiveDateTime::parse_from_str(
            &format!("{} 00:00:00", s),
            "%Y-%m-%d %H:%M:%S",
        ),
    }
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Talk to the Nariz Encantado volunteer system")]
struct Args {
    #[structopt(
        long = "api-url",
        help = "The backend's base URL (defaults to $NARIZ_API_URL or http://localhost:8000)"
    )]
    api_url: Option<String>,
    #[structopt(
        long = "state-file",
        parse(from_os_str),
        help = "Where to keep the login between runs"
    )]
    state_file: Option<PathBuf>,
    #[structopt(
        long = "revalidate",
        help = "Check the saved login with the backend before using it"
    )]
    revalidate: bool,
    #[structopt(
        long = "logout-on-401",
        help = "Forget the saved login when the backend rejects it"
    )]
    logout_on_unauthorized: bool,
    #[structopt(subcommand)]
    cmd: Command,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let mut config = Config::from_env()?;

        if let Some(ref url) = self.api_url {
            config.base_url = config::parse_base_url(url)?;
        }
        config.revalidate_on_startup |= self.revalidate;
        config.logout_on_unauthorized |= self.logout_on_unauthorized;

        Ok(config)
    }

    fn state_file(&self) -> Result<PathBuf, Error> {
        if let Some(ref path) = self.state_file {
            return Ok(path.clone());
        }

        let home = std::env::var_os("HOME")
            .context("$HOME isn't set, use --state-file instead")?;
        Ok(PathBuf::from(home)
            .join(".nariz-encantado")
            .join("session.json"))
    }
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "Log in with your email or CPF")]
    Login {
        #[structopt(short = "u", long = "user", help = "Your email or CPF")]
        identifier: String,
        #[structopt(short = "p", long = "password", help = "Your password")]
        password: String,
    },
    #[structopt(about = "Forget the saved login")]
    Logout,
    #[structopt(about = "Show who is logged in")]
    Whoami,
    #[structopt(about = "Create a volunteer account")]
    Register(UserDetails),
    #[structopt(about = "Ask for a password reset link")]
    ResetPassword { email: String },
    #[structopt(about = "Browse and sign up for events")]
    Events(EventsCommand),
    #[structopt(about = "List the events you signed up for")]
    MyEvents,
    #[structopt(about = "Manage your volunteer documents")]
    Documents(DocumentsCommand),
    #[structopt(about = "User and event management (admin only)")]
    Admin(AdminCommand),
    #[structopt(about = "Financial records (admin only)")]
    Financial(FinancialCommand),
    #[structopt(about = "Check whether the current login may open a page")]
    CanVisit { path: String },
}

#[derive(Debug, StructOpt)]
struct UserDetails {
    #[structopt(long = "full-name")]
    full_name: String,
    #[structopt(long = "clown-name")]
    clown_name: String,
    #[structopt(long = "birth-date", parse(try_from_str = parse_date))]
    birth_date: NaiveDateTime,
    #[structopt(long = "cpf")]
    cpf: String,
    #[structopt(long = "email")]
    email: String,
    #[structopt(long = "password")]
    password: String,
}

impl From<UserDetails> for NewUser {
    fn from(details: UserDetails) -> NewUser {
        NewUser {
            full_name: details.full_name,
            clown_name: details.clown_name,
            birth_date: details.birth_date,
            cpf: details.cpf,
            email: details.email,
            password: details.password,
        }
    }
}

#[derive(Debug, StructOpt)]
enum EventsCommand {
    List {
        #[structopt(long = "skip", default_value = "0")]
        skip: u32,
        #[structopt(long = "limit", default_value = "100")]
        limit: u32,
    },
    Show {
        id: i64,
    },
    #[structopt(about = "Sign up for an event")]
    Register {
        id: i64,
    },
}

#[derive(Debug, StructOpt)]
enum AdminEventsCommand {
    Create(EventDetails),
    Update {
        id: i64,
        #[structopt(flatten)]
        details: EventDetails,
    },
    Delete {
        id: i64,
    },
    #[structopt(about = "Upload an event's image")]
    Image {
        id: i64,
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
struct EventDetails {
    #[structopt(long = "name")]
    name: String,
    #[structopt(long = "when", parse(try_from_str = parse_date))]
    date_time: NaiveDateTime,
    #[structopt(long = "location")]
    location: String,
    #[structopt(long = "spots")]
    total_spots: u32,
    #[structopt(long = "available", help = "Defaults to --spots")]
    available_spots: Option<u32>,
    #[structopt(long = "description")]
    description: Option<String>,
}

impl From<EventDetails> for NewEvent {
    fn from(details: EventDetails) -> NewEvent {
        NewEvent {
            name: details.name,
            date_time: details.date_time,
            location: details.location,
            total_spots: details.total_spots,
            available_spots: details
                .available_spots
                .unwrap_or(details.total_spots),
            description: details.description,
        }
    }
}

#[derive(Debug, StructOpt)]
enum DocumentsCommand {
    List,
    Upload {
        #[structopt(help = "vaccination_proof, id_card or signed_contract")]
        document_type: DocumentType,
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
enum AdminCommand {
    Users,
    #[structopt(about = "Create a new admin account")]
    Create(UserDetails),
    Promote {
        id: i64,
    },
    Demote {
        id: i64,
    },
    #[structopt(about = "Create, change and remove events")]
    Events(AdminEventsCommand),
}

#[derive(Debug, StructOpt)]
enum FinancialCommand {
    List {
        #[structopt(long = "skip", default_value = "0")]
        skip: u32,
        #[structopt(long = "limit", default_value = "100")]
        limit: u32,
    },
    Add {
        #[structopt(long = "type", help = "income or expense")]
        record_type: RecordType,
        #[structopt(long = "amount")]
        amount: f64,
        #[structopt(long = "date", parse(try_from_str = parse_date))]
        date: NaiveDateTime,
        #[structopt(long = "description")]
        description: Option<String>,
    },
    #[structopt(about = "Attach a receipt to a record")]
    Attach {
        id: i64,
        #[structopt(parse(from_os_str))]
        path: PathBuf,
    },
    Summary,
}
