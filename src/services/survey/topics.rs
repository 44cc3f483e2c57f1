//! Built-in headlines and the configured content source.

use esg_survey_core::StaticTopics;

use crate::models::settings::SurveyConfig;

/// Headlines presented when the config does not override them
pub const DEFAULT_HEADLINES: [&str; 9] = [
    "Repsol, entre las 50 empresas que más responsabilidad histórica tienen en el calentamiento global",
    "Amancio Ortega crea un fondo de 100 millones de euros para los afectados de la dana",
    "Freshly Cosmetics despide a 52 empleados en Reus, el 18% de la plantilla",
    "Wall Street y los mercados globales caen ante la incertidumbre por la guerra comercial y el temor a una recesión",
    "El mercado de criptomonedas se desploma: Bitcoin cae a 80.000 dólares, las altcoins se hunden en medio de una frenética liquidación",
    "Granada retrasa seis meses el inicio de la Zona de Bajas Emisiones, previsto hasta ahora para abril",
    "McDonald's donará a la Fundación Ronald McDonald todas las ganancias por ventas del Big Mac del 6 de diciembre",
    "El Gobierno autoriza a altos cargos públicos a irse a Indra, Escribano, CEOE, Barceló, Iberdrola o Airbus",
    "Las aportaciones a los planes de pensiones caen 10.000 millones en los últimos cuatro años",
];

/// Content source for a survey config: the override if present, else the built-in list
pub fn topic_source(config: &SurveyConfig) -> StaticTopics {
    match &config.topics {
        Some(headlines) => StaticTopics::new(headlines.iter().cloned()),
        None => StaticTopics::new(DEFAULT_HEADLINES),
    }
}
