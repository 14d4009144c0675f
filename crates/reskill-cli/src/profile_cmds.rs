//! `reskill profile` subcommands.

use std::fmt::Write as _;

use anyhow::{Result, bail};

use reskill_core::profile::{PROFILE_SAVED_MESSAGE, ProfileEditor, ProfileError, parse_weekly_hours};
use reskill_store::models::{InterestArea, LearningStyle, SkillLevel, UserProfile};

use crate::ProfileCommands;
use crate::app::App;

const NOT_PROVIDED: &str = "Não informado";

/// Field values from `reskill profile set`. `None` leaves a field alone.
#[derive(Debug, Default)]
pub struct ProfileEdits {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub level: Option<SkillLevel>,
    /// Free text, as typed.
    pub hours: Option<String>,
    pub style: Option<LearningStyle>,
    pub area: Option<InterestArea>,
    pub clear_area: bool,
}

impl ProfileEdits {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.goal.is_none()
            && self.level.is_none()
            && self.hours.is_none()
            && self.style.is_none()
            && self.area.is_none()
            && !self.clear_area
    }

    fn apply(self, draft: &mut UserProfile) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(goal) = self.goal {
            draft.goal = goal;
        }
        if let Some(level) = self.level {
            draft.current_skill_level = level;
        }
        if let Some(hours) = self.hours {
            draft.weekly_hours = parse_weekly_hours(&hours);
        }
        if let Some(style) = self.style {
            draft.learning_style = style;
        }
        if self.clear_area {
            draft.interest_area = None;
        } else if let Some(area) = self.area {
            draft.interest_area = Some(area);
        }
    }
}

pub async fn run_profile_command(command: ProfileCommands, app: &App) -> Result<()> {
    let store = app.store().await?;
    let mut editor = ProfileEditor::for_session(app.signal()).map_err(friendly)?;
    editor.load(store.as_ref()).await.map_err(friendly)?;

    match command {
        ProfileCommands::Show => {
            print!("{}", render_profile(editor.profile()));
        }
        ProfileCommands::Set {
            name,
            goal,
            level,
            hours,
            style,
            area,
            clear_area,
        } => {
            let edits = ProfileEdits {
                name,
                goal,
                level,
                hours,
                style,
                area,
                clear_area,
            };
            if edits.is_empty() {
                bail!("nothing to update; pass at least one field (see `reskill profile set --help`)");
            }

            editor.begin_edit();
            edits.apply(editor.draft_mut());
            editor.save(store.as_ref()).await.map_err(friendly)?;

            println!("{PROFILE_SAVED_MESSAGE}");
            println!();
            print!("{}", render_profile(editor.profile()));
        }
    }
    Ok(())
}

fn friendly(err: ProfileError) -> anyhow::Error {
    let message = err.user_message();
    anyhow::Error::new(err).context(message)
}

/// The profile as the view screen lays it out.
pub fn render_profile(profile: &UserProfile) -> String {
    let or_missing = |s: &str| {
        if s.trim().is_empty() {
            NOT_PROVIDED.to_string()
        } else {
            s.to_string()
        }
    };

    let mut out = String::new();
    let _ = writeln!(out, "Meu perfil");
    let _ = writeln!(out, "  Nome:                  {}", or_missing(&profile.name));
    let _ = writeln!(out, "  Objetivo:              {}", or_missing(&profile.goal));
    let _ = writeln!(out, "  Horas semanais:        {} h/semana", profile.weekly_hours);
    let _ = writeln!(out, "  Nível atual:           {}", profile.current_skill_level);
    let _ = writeln!(out, "  Estilo de aprendizado: {}", profile.learning_style);
    let _ = writeln!(
        out,
        "  Área de interesse:     {}",
        profile.interest_area.map_or(NOT_PROVIDED, InterestArea::label)
    );
    out
}
