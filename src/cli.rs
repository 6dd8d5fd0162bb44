use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use getopts::{Matches, Options};

use crate::models::{EventFilters, EventType, UserRole};
use crate::services::calendar::MonthCursor;
use crate::services::dates;

const COMMANDS: &str = "\
Commands:
    login          Sign in (--email, --password)
    register       Create an account and sign in (--name, --email, --password)
    logout         Forget the stored session
    whoami         Show the signed-in user
    dashboard      Event counts and this week's events
    upcoming       Upcoming events (--days 7|14|30)
    calendar       Month grid (--month YYYY-MM)
    events         Event list (--from, --to, --type)
    event ID       Event detail
    create-event   Create an event from a JSON file (--file, --date)
    edit-event ID  Update an event from a JSON file (--file)
    delete-event ID
    users          List users (admin)
    create-user    Create a user (--name, --email, --password, --role)
    edit-user ID   Update a user (--name, --email, --password, --role)
    delete-user ID
    public         Public calendar (--password, --month, --event, --whatsapp)";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login {
        email: String,
        password: String,
    },
    Register {
        nombre: String,
        email: String,
        password: String,
    },
    Logout,
    Whoami,
    Dashboard,
    Upcoming {
        days: Option<u32>,
    },
    Calendar {
        month: Option<MonthCursor>,
    },
    Events {
        filters: EventFilters,
    },
    Event {
        id: String,
    },
    CreateEvent {
        file: PathBuf,
        date: Option<NaiveDate>,
    },
    EditEvent {
        id: String,
        file: PathBuf,
    },
    DeleteEvent {
        id: String,
    },
    Users,
    CreateUser {
        nombre: String,
        email: String,
        password: String,
        rol: Option<UserRole>,
    },
    EditUser {
        id: String,
        nombre: Option<String>,
        email: Option<String>,
        password: Option<String>,
        rol: Option<UserRole>,
    },
    DeleteUser {
        id: String,
    },
    Public {
        password: Option<String>,
        month: Option<MonthCursor>,
        event: Option<String>,
        whatsapp: bool,
    },
}

pub struct Args {
    pub command: Command,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt("e", "email", "Account email", "EMAIL");
    opts.optopt("p", "password", "Account or public calendar password", "PASSWORD");
    opts.optopt("n", "name", "Display name", "NAME");
    opts.optopt("r", "role", "User role: ADMIN or VEEDOR [Default: VEEDOR]", "ROLE");
    opts.optopt("", "days", "Upcoming window: 7, 14 or 30 [Default: UPCOMING_DAYS]", "DAYS");
    opts.optopt("m", "month", "Month to show [Default: current month]", "YYYY-MM");
    opts.optopt("", "from", "Only events from this date", "YYYY-MM-DD");
    opts.optopt("", "to", "Only events up to this date", "YYYY-MM-DD");
    opts.optopt("t", "type", "Only events of this type", "TYPE");
    opts.optopt("f", "file", "JSON file with the event fields", "PATH");
    opts.optopt("d", "date", "Default date of a new event", "YYYY-MM-DD");
    opts.optopt("", "event", "Show the detail of this event", "ID");
    opts.optflag("w", "whatsapp", "Print a WhatsApp reminder link for --event");
    opts
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args) {
        Ok(matches) => matches,
        Err(fail) => {
            eprintln!("{fail}");
            process::exit(1);
        }
    };

    if matches.opt_present("help") || matches.free.is_empty() {
        let brief = format!("Usage: {} COMMAND [options]", env!("CARGO_PKG_NAME"));
        println!("{}\n{}", opts.usage(&brief), COMMANDS);
        process::exit(0);
    }

    match command(&matches) {
        Ok(command) => Args { command },
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

fn command(matches: &Matches) -> Result<Command, String> {
    let name = matches.free[0].as_str();
    let id = || {
        matches
            .free
            .get(1)
            .cloned()
            .ok_or_else(|| format!("Command '{name}' needs an ID"))
    };
    let required = |opt: &str| {
        matches
            .opt_str(opt)
            .ok_or_else(|| format!("Command '{name}' needs --{opt}"))
    };

    let command = match name {
        "login" => Command::Login {
            email: required("email")?,
            password: required("password")?,
        },
        "register" => Command::Register {
            nombre: required("name")?,
            email: required("email")?,
            password: required("password")?,
        },
        "logout" => Command::Logout,
        "whoami" => Command::Whoami,
        "dashboard" => Command::Dashboard,
        "upcoming" => Command::Upcoming {
            days: parse_opt(matches, "days", |s| s.parse::<u32>().map_err(|e| e.to_string()))?,
        },
        "calendar" => Command::Calendar {
            month: parse_opt(matches, "month", parse_month)?,
        },
        "events" => Command::Events {
            filters: EventFilters {
                fecha_desde: parse_opt(matches, "from", parse_date)?,
                fecha_hasta: parse_opt(matches, "to", parse_date)?,
                tipo_evento: parse_opt(matches, "type", |s| s.parse::<EventType>())?,
            },
        },
        "event" => Command::Event { id: id()? },
        "create-event" => Command::CreateEvent {
            file: required("file")?.into(),
            date: parse_opt(matches, "date", parse_date)?,
        },
        "edit-event" => Command::EditEvent {
            id: id()?,
            file: required("file")?.into(),
        },
        "delete-event" => Command::DeleteEvent { id: id()? },
        "users" => Command::Users,
        "create-user" => Command::CreateUser {
            nombre: required("name")?,
            email: required("email")?,
            password: required("password")?,
            rol: parse_opt(matches, "role", |s| s.parse::<UserRole>())?,
        },
        "edit-user" => Command::EditUser {
            id: id()?,
            nombre: matches.opt_str("name"),
            email: matches.opt_str("email"),
            password: matches.opt_str("password"),
            rol: parse_opt(matches, "role", |s| s.parse::<UserRole>())?,
        },
        "delete-user" => Command::DeleteUser { id: id()? },
        "public" => Command::Public {
            password: matches.opt_str("password"),
            month: parse_opt(matches, "month", parse_month)?,
            event: matches.opt_str("event"),
            whatsapp: matches.opt_present("whatsapp"),
        },
        other => return Err(format!("Unknown command '{other}', see --help")),
    };

    Ok(command)
}

fn parse_opt<T>(
    matches: &Matches,
    name: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, String> {
    match matches.opt_str(name) {
        Some(value) => parse(&value)
            .map(Some)
            .map_err(|err| format!("Provided value for option '{name}' is invalid: {err}")),
        None => Ok(None),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    dates::parse_local_date(value).map_err(|e| e.to_string())
}

/// `YYYY-MM`
fn parse_month(value: &str) -> Result<MonthCursor, String> {
    let (year, month) = value
        .split_once('-')
        .ok_or_else(|| format!("expected YYYY-MM, got {value}"))?;
    let year: i32 = year.parse().map_err(|_| format!("invalid year in {value}"))?;
    let month: u32 = month.parse().map_err(|_| format!("invalid month in {value}"))?;
    MonthCursor::new(year, month).map_err(|e| e.to_string())
}
