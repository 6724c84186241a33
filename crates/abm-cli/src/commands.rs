//! Subcommands and their execution against a [`ConnectionProvider`].

use std::io::Write;

use abm_core::{
  contact::{Contact, ContactPatch, NewContact},
  permission::{Action, Role},
  user::User,
};
use abm_service::{ContactService, UserService};
use abm_store_sqlite::ConnectionProvider;
use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Text,
  Json,
}

// ─── Commands ─────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Add, show, edit, remove and list contacts.
  #[command(subcommand)]
  Contact(ContactCommand),

  /// Register users, check credentials and permissions.
  #[command(subcommand)]
  User(UserCommand),

  /// Inspect the database schema.
  #[command(subcommand)]
  Schema(SchemaCommand),
}

#[derive(Subcommand, Debug)]
pub enum ContactCommand {
  Add {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
  },
  Show {
    id: i64,
  },
  /// Change only the fields that are given.
  Edit {
    id:    i64,
    #[command(flatten)]
    patch: PatchArgs,
  },
  Rm {
    id: i64,
  },
  List,
}

#[derive(Args, Debug, Default)]
pub struct PatchArgs {
  #[arg(long)]
  name:        Option<String>,
  #[arg(long, conflicts_with = "clear_phone")]
  phone:       Option<String>,
  #[arg(long, conflicts_with = "clear_email")]
  email:       Option<String>,
  #[arg(long)]
  clear_phone: bool,
  #[arg(long)]
  clear_email: bool,
}

impl From<PatchArgs> for ContactPatch {
  fn from(args: PatchArgs) -> Self {
    let mut patch = ContactPatch::default();
    if let Some(name) = args.name {
      patch = patch.name(name);
    }
    if let Some(phone) = args.phone {
      patch = patch.phone(phone);
    }
    if let Some(email) = args.email {
      patch = patch.email(email);
    }
    if args.clear_phone {
      patch = patch.clear_phone();
    }
    if args.clear_email {
      patch = patch.clear_email();
    }
    patch
  }
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
  Register {
    username: String,
    /// Read from stdin when omitted.
    #[arg(long)]
    password: Option<String>,
    #[arg(long, default_value_t = Role::Basic)]
    role:     Role,
  },
  /// Check credentials and record the access time.
  Login {
    username: String,
    #[arg(long)]
    password: Option<String>,
  },
  /// Log in, then report whether the user may perform `action`.
  Can {
    username: String,
    action:   Action,
    #[arg(long)]
    password: Option<String>,
  },
  List,
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
  /// Compare the entity declarations with the tables on disk.
  Verify,
}

// ─── Execution ────────────────────────────────────────────────────────────────

pub fn run(
  command: Command,
  provider: &ConnectionProvider,
  format: Format,
  out: &mut impl Write,
) -> Result<()> {
  match command {
    Command::Contact(cmd) => run_contact(cmd, provider, format, out),
    Command::User(cmd) => run_user(cmd, provider, format, out),
    Command::Schema(SchemaCommand::Verify) => {
      provider
        .verify_entity::<Contact>()
        .context("contacts table")?;
      provider.verify_entity::<User>().context("users table")?;
      emit(out, format, &"ok", |out| writeln!(out, "schema ok"))
    }
  }
}

fn run_contact(
  cmd: ContactCommand,
  provider: &ConnectionProvider,
  format: Format,
  out: &mut impl Write,
) -> Result<()> {
  let contacts = ContactService::new(provider.repository::<Contact>()?);
  match cmd {
    ContactCommand::Add { name, phone, email } => {
      let mut input = NewContact::named(name);
      if let Some(phone) = phone {
        input = input.phone(phone);
      }
      if let Some(email) = email {
        input = input.email(email);
      }
      let contact = contacts.create(input)?;
      emit(out, format, &contact, |out| write_contact(out, &contact))
    }
    ContactCommand::Show { id } => {
      let Some(contact) = contacts.find(id)? else {
        bail!("no contact with id {id}");
      };
      emit(out, format, &contact, |out| write_contact(out, &contact))
    }
    ContactCommand::Edit { id, patch } => {
      let Some(contact) = contacts.update(id, patch.into())? else {
        bail!("no contact with id {id}");
      };
      emit(out, format, &contact, |out| write_contact(out, &contact))
    }
    ContactCommand::Rm { id } => {
      let removed = contacts.delete(id)?;
      emit(out, format, &removed, |out| {
        if removed {
          writeln!(out, "deleted contact {id}")
        } else {
          writeln!(out, "no contact with id {id}")
        }
      })
    }
    ContactCommand::List => {
      let all = contacts.list_all()?;
      emit(out, format, &all, |out| {
        all.iter().try_for_each(|c| write_contact(&mut *out, c))
      })
    }
  }
}

fn run_user(
  cmd: UserCommand,
  provider: &ConnectionProvider,
  format: Format,
  out: &mut impl Write,
) -> Result<()> {
  let users = UserService::new(provider.repository::<User>()?);
  match cmd {
    UserCommand::Register { username, password, role } => {
      let password = password_or_stdin(password)?;
      let user = users.register(&username, &password, role)?;
      emit(out, format, &user, |out| write_user(out, &user))
    }
    UserCommand::Login { username, password } => {
      let password = password_or_stdin(password)?;
      let Some(user) = users.login(&username, &password)? else {
        bail!("invalid credentials for {username:?}");
      };
      emit(out, format, &user, |out| write_user(out, &user))
    }
    UserCommand::Can { username, action, password } => {
      let password = password_or_stdin(password)?;
      let Some(user) = users.login(&username, &password)? else {
        bail!("invalid credentials for {username:?}");
      };
      let allowed = users.authorize(&user, action).is_ok();
      emit(out, format, &allowed, |out| {
        let verdict = if allowed { "allowed" } else { "denied" };
        writeln!(out, "{verdict}: {} ({}) {action}", user.username(), user.role())
      })
    }
    UserCommand::List => {
      let all = users.list_all()?;
      emit(out, format, &all, |out| all.iter().try_for_each(|u| write_user(&mut *out, u)))
    }
  }
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn emit<W, T, F>(out: &mut W, format: Format, value: &T, text: F) -> Result<()>
where
  W: Write,
  T: Serialize + ?Sized,
  F: FnOnce(&mut W) -> std::io::Result<()>,
{
  match format {
    Format::Json => {
      serde_json::to_writer_pretty(&mut *out, value)?;
      writeln!(out)?;
    }
    Format::Text => text(out)?,
  }
  Ok(())
}

fn write_contact(out: &mut impl Write, contact: &Contact) -> std::io::Result<()> {
  writeln!(out, "{}\t{contact}", contact.id().unwrap_or_default())
}

fn write_user(out: &mut impl Write, user: &User) -> std::io::Result<()> {
  let last = user
    .last_access()
    .map_or_else(|| "never".to_owned(), |t| t.to_rfc3339());
  writeln!(
    out,
    "{}\t{}\t{}\tlast access: {last}",
    user.id().unwrap_or_default(),
    user.username(),
    user.role()
  )
}

/// Use `given`, or read one line from stdin.
fn password_or_stdin(given: Option<String>) -> Result<String> {
  use std::io::BufRead as _;

  if let Some(password) = given {
    return Ok(password);
  }
  eprint!("Password: ");
  std::io::stderr().flush().ok();
  let mut line = String::new();
  std::io::stdin()
    .lock()
    .read_line(&mut line)
    .context("reading password")?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
