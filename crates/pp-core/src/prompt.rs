//! Message payloads for the text-generation service
//!
//! The service itself lives outside this crate. These builders only embed
//! the structured matrix data (table, positions, canon excerpts) and the
//! user's points into system/user messages. The focus prompt pins the JSON
//! shape that [`crate::plan::parse_plan`] reads back.

use serde::{Deserialize, Serialize};

use crate::canon::{Canon, CanonBundle};
use crate::matrix::PositionalView;
use crate::profile::Profile;
use crate::{Error, Result};

/// Name used when the profile has none
pub const DEFAULT_CLIENT_NAME: &str = "Клиент";

/// A system/user message pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Messages {
    pub system: String,
    pub user: String,
}

const FOCUS_SYSTEM: &str = "\
Ты — навигатор по реализации через Personal Potentials (матрица 3×3).
Дай практичный план без давления. Не терапия. Не диагноз.
Ответ строго в JSON по схеме:
{\"weekly_focus\": \"...\", \"focus_explainer\": \"...\", \"action_blocks\": [
  {\"key\": \"structure\", \"items\": [{\"id\": \"...\", \"title\": \"...\", \"minutes\": 15, \"freq\": \"daily\"}]},
  {\"key\": \"focus\", \"items\": []},
  {\"key\": \"growth\", \"items\": []},
  {\"key\": \"energy\", \"items\": []}
]}
Ограничения: 3–5 задач на блок; задачи маленькие и измеримые; freq только daily/weekly; minutes 10–45.";

const REPORT_SYSTEM: &str = "\
Ты — методист отчётов по Personal Potentials (матрица 3×3). Пиши по-русски, от первого лица.
Не задавай вопросов. Описывай потенциалы только по CANON_EXCERPTS; если для позиции стоит «—», \
так и напиши, что в каноне данных нет.
Столбцы: восприятие, мотивация, инструмент. Ряды: 1 — ядро (≈60%), 2 — наполнение/социальный слой (≈30%), \
3 — риски/делегирование (≈10%).
Формат: Markdown с заголовками, таблицами и списками.";

const REPORT_USER_HEADER: &str = "\
Сделай расширенный отчёт по матрице: матрица 3×3; как её читать; 1 ряд (позиции 1–3) подробно; \
2 ряд (позиции 4–6); 3 ряд (риски и делегирование); механика Точки А; мост к Точке Б; итог «Кто я».";

/// Structured input embedded in the report prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub name: String,
    pub point_a: String,
    pub point_b: String,
    pub matrix_table_md: String,
    pub positions: PositionalView,
    #[serde(rename = "CANON_EXCERPTS")]
    pub canon_excerpts: CanonBundle,
}

/// Messages asking for this week's focus and plan
///
/// # Errors
/// Returns `MissingInput` when the potentials or either point is empty.
pub fn focus_messages(profile: &Profile) -> Result<Messages> {
    if !profile.foundation.has_potentials() {
        return Err(Error::MissingInput("potentials"));
    }
    let r = &profile.realization;
    if r.point_a.trim().is_empty() {
        return Err(Error::MissingInput("point_a"));
    }
    if r.point_b.trim().is_empty() {
        return Err(Error::MissingInput("point_b"));
    }

    let table = profile.foundation.potentials().markdown_table();
    let user = format!(
        "Матрица 3×3:\n{}\n\nТочка А:\n{}\n\nТочка Б:\n{}\n\nСгенерируй фокус недели и план.\n",
        table,
        r.point_a.trim(),
        r.point_b.trim()
    );
    Ok(Messages {
        system: FOCUS_SYSTEM.to_string(),
        user,
    })
}

/// Structured payload for the extended report
///
/// # Errors
/// Returns `MissingInput` when the potentials are empty.
pub fn report_payload(profile: &Profile, canon: &Canon) -> Result<ReportPayload> {
    if !profile.foundation.has_potentials() {
        return Err(Error::MissingInput("potentials"));
    }
    let nine = profile.foundation.potentials();
    let positions = nine.positions();
    let canon_excerpts = canon.bundle(&positions);
    tracing::debug!(covered = canon_excerpts.covered(), "built canon bundle");

    let name = profile.foundation.name.trim();
    Ok(ReportPayload {
        name: if name.is_empty() {
            DEFAULT_CLIENT_NAME.to_string()
        } else {
            name.to_string()
        },
        point_a: profile.realization.point_a.trim().to_string(),
        point_b: profile.realization.point_b.trim().to_string(),
        matrix_table_md: nine.markdown_table(),
        positions,
        canon_excerpts,
    })
}

/// Messages asking for the extended report
pub fn report_messages(profile: &Profile, canon: &Canon) -> Result<Messages> {
    let payload = report_payload(profile, canon)?;
    let json = serde_json::to_string(&payload).map_err(|e| Error::Schema(e.to_string()))?;
    Ok(Messages {
        system: REPORT_SYSTEM.to_string(),
        user: format!("{}\n\nВходные данные (json):\n{}", REPORT_USER_HEADER, json),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::EMPTY_EXCERPT;
    use chrono::{TimeZone, Utc};

    fn profile() -> Profile {
        let mut p = Profile::new(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap());
        p.set_foundation("", "1. Сапфир 2. Янтарь 3. Рубин");
        p.set_points("Работаю не по призванию", "Своё дело");
        p
    }

    #[test]
    fn test_focus_messages() {
        let m = focus_messages(&profile()).unwrap();
        assert!(m.system.contains("\"weekly_focus\""));
        assert!(m.user.contains("| 1 (ядро / 60%) | Сапфир | Янтарь | Рубин |"));
        assert!(m.user.contains("Точка А:\nРаботаю не по призванию"));
        assert!(m.user.contains("Точка Б:\nСвоё дело"));
    }

    #[test]
    fn test_focus_messages_missing_inputs() {
        let mut p = profile();
        p.realization.point_b.clear();
        assert!(matches!(focus_messages(&p), Err(Error::MissingInput("point_b"))));

        p.realization.point_a = "  ".into();
        assert!(matches!(focus_messages(&p), Err(Error::MissingInput("point_a"))));

        p.foundation.potentials_table.clear();
        assert!(matches!(focus_messages(&p), Err(Error::MissingInput("potentials"))));
    }

    #[test]
    fn test_report_payload() {
        let canon = Canon::from_json(r#"{"cells": {"Сапфир": {"perception": "Глубина"}}}"#).unwrap();
        let payload = report_payload(&profile(), &canon).unwrap();
        assert_eq!(payload.name, DEFAULT_CLIENT_NAME);
        assert_eq!(payload.positions.get(1), Some("Сапфир"));
        assert_eq!(payload.positions.get(4), Some("Аметист"));
        assert_eq!(payload.canon_excerpts.canon_row1["pos1"], "Глубина");
        assert_eq!(payload.canon_excerpts.canon_row1["pos2"], EMPTY_EXCERPT);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["CANON_EXCERPTS"]["canon_row1"]["pos1"], "Глубина");
        assert_eq!(json["positions"]["pos3"], "Рубин");
    }

    #[test]
    fn test_report_messages_embed_payload() {
        let mut p = profile();
        p.foundation.name = "Анна".into();
        let m = report_messages(&p, &Canon::default()).unwrap();
        assert!(m.system.contains("CANON_EXCERPTS"));
        let (_, json) = m.user.split_once("Входные данные (json):\n").unwrap();
        let payload: ReportPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.name, "Анна");
        assert_eq!(payload.point_b, "Своё дело");
    }

    #[test]
    fn test_report_requires_potentials() {
        let mut p = profile();
        p.foundation.potentials_table = " ".into();
        assert!(matches!(
            report_messages(&p, &Canon::default()),
            Err(Error::MissingInput("potentials"))
        ));
    }
}
