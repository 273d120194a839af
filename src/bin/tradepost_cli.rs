//!
//! tradepost CLI binary
//! --------------------
//! Command-line tool and interactive interpreter for a local tradepost
//! store: login/logout, listing collections and basic record edits. Useful
//! for inspecting and repairing a portal data directory without the UI.

use std::env;

use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tradepost::identity::{
    is_admin, is_partner, AuthProvider, LocalAuthProvider, LoginOutcome, LoginRequest,
    NoNavigation, SessionManager,
};
use tradepost::storage::{Product, Store, COLLECTION_KEYS};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--root <data_dir>] [--command \"<cmd>\"]\n  {program} --repl [--root <data_dir>]    # start interactive interpreter\n\nFlags:\n  --root <path>            Data directory for the store (default: $TRADEPOST_DATA_DIR or 'data')\n  --repl                   Start interactive mode\n  -c, --command <cmd>      Run a one-shot command and exit\n  -h, --help               Show this help\n\nCommands:\n  login <email> <password>           authenticate and open a session\n  logout                             clear the session\n  whoami                             show the current user and roles\n  collections                        list known collection keys\n  list <collection>                  print a collection as JSON\n  get <collection> <id>              print one record\n  add-product <name> <price>         add a product record\n  update <collection> <id> <json>    shallow-merge a JSON patch over a record\n  delete <collection> <id>           delete a record by id\n  help                               show this help\n  quit | exit                        exit the interpreter"
    );
}

fn known_collection(key: &str) -> Result<&str> {
    COLLECTION_KEYS
        .iter()
        .find(|k| **k == key)
        .copied()
        .ok_or_else(|| anyhow!("unknown collection '{}' (see `collections`)", key))
}

fn run_command(
    store: &Store,
    sessions: &SessionManager,
    provider: &LocalAuthProvider,
    line: &str,
) -> Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        [] => {}
        ["quit"] | ["exit"] => return Ok(false),
        ["help"] => print_usage("tradepost_cli"),
        ["login", email, password] => {
            let req = LoginRequest { email: email.to_string(), password: password.to_string() };
            match provider.login(&req)? {
                LoginOutcome::Success { user } => {
                    println!("ok: logged in as {} ({})", user.fields.email, user.fields.role.as_str())
                }
                LoginOutcome::InvalidCredentials => println!("error: invalid credentials"),
            }
        }
        ["logout"] => {
            sessions.logout(&NoNavigation)?;
            println!("ok: session cleared");
        }
        ["whoami"] => match sessions.current_user()? {
            Some(user) => println!(
                "{} <{}> role={} admin={} partner={}",
                user.fields.contact_person,
                user.fields.email,
                user.fields.role.as_str(),
                is_admin(sessions)?,
                is_partner(sessions)?
            ),
            None => println!("not logged in"),
        },
        ["collections"] => {
            for key in COLLECTION_KEYS {
                println!("{}", key);
            }
        }
        ["list", key] => {
            let rows = store.list_raw(known_collection(key)?)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        ["get", key, id] => match store.get_raw(known_collection(key)?, id)? {
            Some(row) => println!("{}", serde_json::to_string_pretty(&row)?),
            None => println!("not found: {}", id),
        },
        ["add-product", name, price] => {
            let price: f64 = price.parse().map_err(|_| anyhow!("bad price '{}'", price))?;
            let record = store.add(Product {
                name: name.to_string(),
                price,
                is_active: true,
                ..Default::default()
            })?;
            println!("ok: added product {}", record.id);
        }
        ["update", key, id, rest @ ..] => {
            let raw = rest.join(" ");
            let patch = serde_json::from_str::<serde_json::Value>(&raw)
                .map_err(|e| anyhow!("bad patch JSON: {}", e))?;
            let patch = patch
                .as_object()
                .cloned()
                .ok_or_else(|| anyhow!("patch must be a JSON object"))?;
            match store.update_raw(known_collection(key)?, id, patch)? {
                Some(row) => println!("{}", serde_json::to_string_pretty(&row)?),
                None => println!("not found: {}", id),
            }
        }
        ["delete", key, id] => {
            let removed = store.delete_raw(known_collection(key)?, id)?;
            println!("ok: removed={}", removed);
        }
        other => return Err(anyhow!("unrecognized command: {:?} (try `help`)", other.join(" "))),
    }
    Ok(true)
}

fn main() -> Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| "tradepost_cli".to_string());

    let mut root: Option<String> = None;
    let mut repl = false;
    let mut one_shot: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--root" => {
                i += 1;
                root = Some(args.get(i).cloned().ok_or_else(|| anyhow!("--root needs a path"))?);
            }
            "--repl" => repl = true,
            "-c" | "--command" => {
                i += 1;
                one_shot =
                    Some(args.get(i).cloned().ok_or_else(|| anyhow!("--command needs a value"))?);
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => return Err(anyhow!("unknown flag '{}'", other)),
        }
        i += 1;
    }

    let data_dir = root
        .or_else(|| env::var("TRADEPOST_DATA_DIR").ok())
        .unwrap_or_else(|| "data".to_string());
    info!(target: "tradepost", "opening store at '{}'", data_dir);

    let store = Store::open_dir(&data_dir)?;
    let sessions = SessionManager::new(store.clone());
    let provider = LocalAuthProvider::new(sessions.clone());

    if let Some(cmd) = one_shot {
        run_command(&store, &sessions, &provider, &cmd)?;
        return Ok(());
    }
    if !repl {
        print_usage(&program);
        return Ok(());
    }

    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("tradepost> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                match run_command(&store, &sessions, &provider, &line) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
