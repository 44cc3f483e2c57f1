//! Prompt Templates and User-Facing Text
//!
//! The judge, follow-up and profile templates are built from the survey config
//! so labels and dimensions stay in sync with the parsers that read the output.

use esg_survey_llm::PromptTemplate;

use crate::models::settings::{ProfilePatternConfig, SufficiencyPatternConfig};

/// Session title shown before the first topic
pub const GREETING: &str = "Chatbot de Análisis de Sentimiento";

/// Prefix of the profile message
pub const PROFILE_PREFIX: &str = "**Perfil del inversor:**";

/// Bar chart title
pub const CHART_TITLE: &str = "Perfil del Inversor";

/// Bar chart value axis label
pub const CHART_VALUE_LABEL: &str = "Puntuación (0-100)";

/// Shown after a successful row append
pub const SAVED_MESSAGE: &str = "Respuestas y perfil guardados.";

/// Fallback when the follow-up generator has no usable question and no category
pub const GENERIC_FOLLOW_UP: &str = "Por favor, ¿podrías profundizar en qué aspectos específicos de la noticia te preocupan, ya sea en términos de sostenibilidad o de riesgo?";

/// Message that introduces a topic
pub fn topic_message(headline: &str) -> String {
    format!("¿Qué opinas sobre esta noticia? {}", headline)
}

/// Profile message shown once scores are available
pub fn profile_message(raw_profile: &str) -> String {
    format!("{} {}", PROFILE_PREFIX, raw_profile.trim())
}

/// Visible warning when the row could not be stored
pub fn save_error_message(detail: &str) -> String {
    format!("Error al guardar datos: {}", detail)
}

/// Visible error when the synthesizer output is unusable
pub fn profile_error_message(detail: &str) -> String {
    format!("No se pudo generar el perfil del inversor: {}", detail)
}

/// Clarifying question used when generation fails
pub fn fallback_follow_up(category: Option<&str>) -> String {
    match category {
        Some(dimension) => format!(
            "¿Podrías profundizar en qué aspectos concretos de la noticia te preocupan en la dimensión {}?",
            dimension
        ),
        None => GENERIC_FOLLOW_UP.to_string(),
    }
}

/// Literal text inside a template must not be read as a placeholder
fn escape(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Template with `{noticia}` and `{respuesta}` asking for `Suficiente: Sí|No`
pub fn judge_template(pattern: &SufficiencyPatternConfig, dimensions: &[String]) -> PromptTemplate {
    let label = escape(&pattern.label);
    let yes = pattern.yes.first().map(|w| escape(w)).unwrap_or_default();
    let no = pattern.no.first().map(|w| escape(w)).unwrap_or_default();
    let category = escape(&pattern.category_label);
    let dims = escape(&dimensions.join(", "));

    PromptTemplate::new(format!(
        r#"Noticia: {{noticia}}
Respuesta del inversor: {{respuesta}}

Evalúa si la respuesta contiene suficiente información para analizar el sentimiento y la preocupación del inversor sobre la noticia.
Indica únicamente una de las siguientes opciones:
- "{label}: {yes}"
- "{label}: {no}"
Si la respuesta no es suficiente, añade una segunda línea "{category}: <dimensión>" con la dimensión menos tratada entre: {dims}."#
    ))
}

/// Template with `{noticia}`, `{respuesta}` and `{enfoque}` asking for one question
pub fn follow_up_template() -> PromptTemplate {
    PromptTemplate::new(
        r#"Noticia: {noticia}
Respuesta del inversor: {respuesta}
{enfoque}
La respuesta no aborda de manera suficiente los aspectos de la noticia relacionados con ESG (Ambiental, Social y Gobernanza) o con el riesgo.
Formula una única pregunta de seguimiento, breve y dirigida al inversor, para que profundice en qué aspectos específicos de la noticia le preocupan, ya sea en términos de sostenibilidad o de riesgo.
Responde solo con la pregunta."#,
    )
}

/// Focus line for the follow-up template
pub fn follow_up_focus(category: Option<&str>) -> String {
    match category {
        Some(dimension) => format!("Aspecto a profundizar: {}", dimension),
        None => String::new(),
    }
}

/// Template with `{analisis}` asking for one `Label: score` pair per dimension
pub fn profile_template(pattern: &ProfilePatternConfig, dimensions: &[String]) -> PromptTemplate {
    let format_line = dimensions
        .iter()
        .map(|d| format!("{}{} [puntuación]", escape(d), escape(&pattern.separator)))
        .collect::<Vec<_>>()
        .join(", ");
    let dims = escape(&dimensions.join(", "));

    PromptTemplate::new(format!(
        r#"Análisis de reacciones: {{analisis}}

Genera un perfil detallado del inversor basado en sus reacciones, enfocándote en ESG (Ambiental, Social y Gobernanza) y su aversión al riesgo.
Asigna una puntuación entera de 0 a 100 para cada una de estas dimensiones: {dims}, en este formato:
{format_line}"#
    ))
}
