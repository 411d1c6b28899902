use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use roster::record::{FieldMap, UserId};
use roster::{JsonStore, UserRecord, UserStore};

#[derive(Parser, Debug)]
#[clap(version, about, propagate_version = true)]
struct Cli {
    /// Path to the users file to operate on
    #[clap(value_parser)]
    path: PathBuf,

    /// Action to perform
    #[clap(subcommand)]
    action: Subcommands,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// List all users
    List,
    /// Show all fields of a single user
    Show(ById),
    /// Add a new user
    Add(UserFields),
    /// Edit fields of an existing user
    Edit(EditUser),
    /// Remove a user
    Remove(ById),
}

#[derive(Args, Debug)]
struct ById {
    /// Id of the user
    #[clap(long, value_parser)]
    id: UserId,
}

#[derive(Args, Debug)]
struct UserFields {
    #[clap(long, value_parser)]
    first_name: Option<String>,

    #[clap(long, value_parser)]
    last_name: Option<String>,

    #[clap(long, value_parser)]
    email: Option<String>,

    #[clap(long, value_parser)]
    gender: Option<String>,

    #[clap(long, value_parser)]
    job_title: Option<String>,
}

impl UserFields {
    fn into_map(self) -> FieldMap {
        let mut fields = FieldMap::new();
        for (name, value) in [
            ("first_name", self.first_name),
            ("last_name", self.last_name),
            ("email", self.email),
            ("gender", self.gender),
            ("job_title", self.job_title),
        ] {
            if let Some(value) = value {
                fields.insert(name.to_owned(), value);
            }
        }
        return fields;
    }
}

#[derive(Args, Debug)]
struct EditUser {
    /// Id of the user to edit
    #[clap(long, value_parser)]
    id: UserId,

    #[clap(flatten)]
    fields: UserFields,
}

fn print_user(record: &UserRecord) {
    println!("{}", format!("#{}", record.id).bold());
    for (name, value) in &record.fields {
        let value = if name == "email" {
            value.as_str().cyan()
        } else {
            value.as_str().normal()
        };
        println!("  {}: {}", name, value);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let mut store = UserStore::open(JsonStore::new(&args.path))?;

    match args.action {
        Subcommands::List => {
            for record in store.records() {
                println!("{}", record);
            }
        }
        Subcommands::Show(by_id) => match store.find_by_id(by_id.id) {
            Some(record) => print_user(record),
            None => {
                eprintln!("{}", format!("no user exists with id {}", by_id.id).red());
                std::process::exit(1);
            }
        },
        Subcommands::Add(fields) => {
            let record = store.insert(fields.into_map())?;
            println!("added user {}", format!("#{}", record.id).green());
        }
        Subcommands::Edit(edit) => {
            let record = store.update(edit.id, edit.fields.into_map())?;
            print_user(&record);
        }
        Subcommands::Remove(by_id) => {
            store.remove(by_id.id)?;
            println!("removed user {}", format!("#{}", by_id.id).green());
        }
    }

    return Ok(());
}
