//! Plan generation: prompt construction and the shape of the generated
//! draft. Pure logic, no I/O.

use serde::Deserialize;
use serde_json::Value;

use reskill_store::models::UserProfile;

/// JSON contract appended to the planner prompt.
const RESPONSE_FORMAT: &str = r#"Responda APENAS com JSON no formato:

{
  "summary": "texto curto explicando o foco da semana",
  "tasks": [
    {
      "id": "string",
      "title": "string",
      "description": "string",
      "estimatedMinutes": 45
    }
  ]
}"#;

const NAME_NOT_PROVIDED: &str = "não informado";
const AREA_NOT_PROVIDED: &str = "não informada";

// ---------------------------------------------------------------------------
// Draft types
// ---------------------------------------------------------------------------

/// What the planner returns, before defaults are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanDraft {
    #[serde(default)]
    pub summary: Option<String>,
    pub tasks: Vec<TaskDraft>,
}

/// One generated task. Fields are kept loose: models return numbers as
/// strings, ids as numbers, and sometimes omit fields entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<Value>,
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Build the weekly planner prompt for `profile`.
pub fn build_plan_prompt(profile: &UserProfile) -> String {
    let name = if profile.name.trim().is_empty() {
        NAME_NOT_PROVIDED
    } else {
        profile.name.as_str()
    };
    let area = profile
        .interest_area
        .map(|a| a.code())
        .unwrap_or(AREA_NOT_PROVIDED);

    let mut prompt = String::with_capacity(1024);
    prompt.push_str("Você é um planejador de estudos de carreira.\n");
    prompt.push_str("Gere um plano de aprendizado para UMA semana, em formato JSON.\n\n");
    prompt.push_str("Perfil da pessoa:\n");
    prompt.push_str(&format!("- Nome: {name}\n"));
    prompt.push_str(&format!("- Objetivo: {}\n", profile.goal));
    prompt.push_str(&format!("- Nível atual: {}\n", profile.current_skill_level));
    prompt.push_str(&format!(
        "- Horas disponíveis por semana: {}\n",
        profile.weekly_hours
    ));
    prompt.push_str(&format!(
        "- Estilo de aprendizado: {}\n",
        profile.learning_style
    ));
    prompt.push_str(&format!("- Área de interesse: {area}\n\n"));
    prompt.push_str(RESPONSE_FORMAT);
    prompt
}
