//! `skilltrade`: sign up, sign in, and manage a SkillTrade profile against
//! the local backend.
//!
//! # Usage
//!
//! ```
//! skilltrade signup --name Ana --email ana@example.com --have Go --want Rust
//! skilltrade status
//! skilltrade update --bio "Backend developer" --work online
//! skilltrade upload-picture ~/me.png
//! skilltrade logout
//! ```
//!
//! Passwords are read from `SKILLTRADE_PASSWORD` or prompted on stdin.

mod app;
mod cache;
mod settings;

use std::{io, path::PathBuf, str::FromStr};

use anyhow::{Context as _, Result};
use app::{App, read_picture};
use clap::{Args, Parser, Subcommand};
use settings::Settings;
use skilltrade_core::{
  Password,
  profile::{Availability, ExperienceLevel, Profile, ProfilePatch, WorkMode},
};
use skilltrade_state::{MenuEntry, NavigationSnapshot, ProfileDraft, SkillList};
use strum::VariantNames;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "skilltrade", version, about = "Manage your SkillTrade profile")]
struct Cli {
  /// Path to a TOML settings file.
  #[arg(short, long, value_name = "FILE", default_value = "skilltrade.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account and a profile in one go.
  Signup(SignupArgs),
  /// Sign in to an existing account.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "SKILLTRADE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  /// Sign out and clear cached session data.
  Logout,
  /// Show who is signed in and what the menu offers.
  Status,
  /// Change fields of the signed-in user's profile.
  Update(UpdateArgs),
  /// Upload a new profile picture.
  UploadPicture {
    /// Image file (png, jpg, gif, webp, svg, avif).
    path: PathBuf,
  },
}

#[derive(Args, Debug)]
struct SignupArgs {
  #[arg(long)]
  name:         String,
  #[arg(long)]
  email:        String,
  #[arg(long, env = "SKILLTRADE_PASSWORD", hide_env_values = true)]
  password:     Option<String>,
  #[arg(long)]
  bio:          Option<String>,
  #[arg(long)]
  location:     Option<String>,
  /// A skill you can offer; repeat for more.
  #[arg(long = "have", value_name = "SKILL")]
  have:         Vec<String>,
  /// A skill you want to learn; repeat for more.
  #[arg(long = "want", value_name = "SKILL")]
  want:         Vec<String>,
  /// A skill to feature first; repeat for more.
  #[arg(long = "top", value_name = "SKILL")]
  top:          Vec<String>,
  #[arg(long, value_parser = parse_variant::<ExperienceLevel>)]
  experience:   Option<ExperienceLevel>,
  #[arg(long, value_parser = parse_variant::<Availability>)]
  availability: Option<Availability>,
  #[arg(long, value_parser = parse_variant::<WorkMode>)]
  work:         Option<WorkMode>,
  #[arg(long, value_name = "FILE")]
  picture:      Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
  #[arg(long)]
  name:         Option<String>,
  /// New bio; an empty string clears it.
  #[arg(long)]
  bio:          Option<String>,
  /// New location; an empty string clears it.
  #[arg(long)]
  location:     Option<String>,
  /// Replace the skills you offer.
  #[arg(long = "have", value_name = "SKILL")]
  have:         Option<Vec<String>>,
  /// Replace the skills you want.
  #[arg(long = "want", value_name = "SKILL")]
  want:         Option<Vec<String>>,
  #[arg(long, value_parser = parse_variant::<ExperienceLevel>)]
  experience:   Option<ExperienceLevel>,
  #[arg(long, value_parser = parse_variant::<Availability>)]
  availability: Option<Availability>,
  #[arg(long, value_parser = parse_variant::<WorkMode>)]
  work:         Option<WorkMode>,
  #[arg(long, value_name = "FILE")]
  picture:      Option<PathBuf>,
}

fn parse_variant<T: FromStr + VariantNames>(s: &str) -> Result<T, String> {
  s.parse()
    .map_err(|_| format!("expected one of: {}", T::VARIANTS.join(", ")))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let app = App::open(&settings).await?;

  match cli.command {
    Command::Signup(args) => signup(&app, args).await?,
    Command::Login { email, password } => {
      let password = password_or_prompt(password)?;
      app.login(&email, &password).await?;
      print_status(&app.snapshot());
    }
    Command::Logout => {
      app.logout().await;
      println!("Signed out.");
    }
    Command::Status => {
      print_status(&app.snapshot());
      if let Some(profile) = app.profile() {
        for line in profile_lines(&profile) {
          println!("{line}");
        }
      }
    }
    Command::Update(args) => {
      let picture = match &args.picture {
        Some(path) => Some(read_picture(path).await?),
        None => None,
      };
      let profile = app.update(patch_from(args), picture).await?;
      println!("Profile updated at {}.", profile.updated_at.to_rfc3339());
    }
    Command::UploadPicture { path } => {
      let file = read_picture(&path).await?;
      let url = app.upload_picture(file).await?;
      println!("Picture uploaded: {url}");
    }
  }

  Ok(())
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn signup(app: &App, args: SignupArgs) -> Result<()> {
  let mut draft = ProfileDraft {
    name: args.name,
    email: args.email,
    password: password_or_prompt(args.password)?,
    bio: args.bio.unwrap_or_default(),
    location: args.location.unwrap_or_default(),
    top_skills: args.top,
    experience_level: args.experience,
    availability: args.availability,
    preferred_work: args.work,
    ..ProfileDraft::default()
  };
  for (list, skills) in [(SkillList::Have, args.have), (SkillList::Want, args.want)] {
    for skill in skills {
      *draft.input_mut(list) = skill;
      draft.add_skill(list);
    }
  }
  if let Some(path) = &args.picture {
    let file = read_picture(path).await?;
    draft
      .select_picture(file)
      .with_context(|| format!("cannot use {} as a profile picture", path.display()))?;
  }

  let done = app.signup(draft).await?;
  if let Some(e) = &done.picture_error {
    eprintln!("warning: {e}; your profile was created without a picture");
  }
  println!("Welcome, {}! Next: {}", done.profile.name, done.redirect);
  Ok(())
}

fn patch_from(args: UpdateArgs) -> ProfilePatch {
  fn nullable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| {
      let v = v.trim().to_owned();
      (!v.is_empty()).then_some(v)
    })
  }

  ProfilePatch {
    name: args.name,
    bio: nullable(args.bio),
    location: nullable(args.location),
    skills_i_have: args.have,
    skills_i_want: args.want,
    experience_level: args.experience.map(Some),
    availability: args.availability.map(Some),
    preferred_work: args.work.map(Some),
    ..ProfilePatch::default()
  }
}

fn print_status(snapshot: &NavigationSnapshot) {
  match &snapshot.summary {
    Some(summary) => {
      println!("[{}] {} <{}>", summary.initial, summary.display_name, summary.email);
      if !summary.picture_url.is_empty() {
        println!("picture: {}", summary.picture_url);
      }
    }
    None => println!("Not signed in."),
  }
  let menu: Vec<_> = snapshot
    .menu()
    .into_iter()
    .map(|entry| match entry {
      MenuEntry::Navigate(to) => format!("{} ({to})", entry.label()),
      MenuEntry::Logout => entry.label().to_owned(),
    })
    .collect();
  println!("menu: {}", menu.join(" | "));
}

/// The profile details `status` prints below the header.
fn profile_lines(profile: &Profile) -> Vec<String> {
  let mut lines = Vec::new();
  let mut field = |name: &str, value: Option<&str>| {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
      lines.push(format!("{name}: {value}"));
    }
  };
  field("bio", profile.bio.as_deref());
  field("location", profile.location.as_deref());
  field("experience", profile.experience_level.map(ExperienceLevel::label));
  field("availability", profile.availability.map(Availability::label));
  field("work", profile.preferred_work.map(WorkMode::label));
  field("offers", Some(profile.skills_i_have.join(", ").as_str()));
  field("wants", Some(profile.skills_i_want.join(", ").as_str()));
  lines
}

/// Use `given`, or read a password from stdin.
fn password_or_prompt(given: Option<String>) -> Result<Password> {
  use std::io::{BufRead, Write};
  if let Some(password) = given {
    return Ok(Password::new(password));
  }
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(Password::new(line.trim_end_matches(['\n', '\r'])))
}
