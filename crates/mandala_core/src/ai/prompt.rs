//! Prompt construction for AI fill and coaching advice.

use crate::model::grid::Grid;
use crate::model::layout::SATELLITE_BLOCKS;
use serde::Serialize;

/// What an AI fill request should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    /// One suggestion for the selected cell.
    Single,
    /// Eight actions for the selected block (sub-themes when it is block 4).
    Block,
    /// Eight sub-themes for the main theme.
    SubThemes,
    /// Eight sub-themes with eight actions each.
    Full,
}

impl FillMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "block" => Some(Self::Block),
            "subthemes" | "sub_themes" | "sub-themes" => Some(Self::SubThemes),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Block => "block",
            Self::SubThemes => "sub_themes",
            Self::Full => "full",
        }
    }
}

/// Builds the fill prompt.
///
/// `block_topic` is the sub-theme the block mode should expand; when absent
/// the prompt falls back to the main theme.
pub fn fill_prompt(mode: FillMode, main_theme: &str, block_topic: Option<&str>) -> String {
    match mode {
        FillMode::Full => format!(
            "マンダラチャート（9x9の目標達成シート）を作成しています。\n\
             メインテーマ「{main_theme}」を達成するために必要な、8つのサブテーマと、それぞれのサブテーマに対する8つの具体的な行動（ToDo）を全て生成してください。\n\
             合計72項目（サブテーマ8 + 各ToDo8x8）が必要です。\n\
             各項目は簡潔に、**20文字以内**で記述してください。\n\
             出力は以下のJSON形式のみで行ってください。\n\
             [ {{ \"theme\": \"サブテーマ1\", \"actions\": [\"行動1\", \"行動2\", ..., \"行動8\"] }}, ... ]"
        ),
        FillMode::SubThemes => format!(
            "マンダラチャートのメインテーマ「{main_theme}」を達成するために必要な、8つの具体的な要素（サブテーマ）を日本語で挙げてください。\n\
             各項目は簡潔に、**20文字以内**に収めてください。\n\
             出力はJSON配列形式（[\"項目1\", \"項目2\", ...]）のみにしてください。"
        ),
        FillMode::Block => {
            let context = match block_topic.filter(|topic| !topic.is_empty()) {
                Some(topic) => format!("サブテーマ「{topic}」"),
                None => format!("メインテーマ「{main_theme}」に関連する要素"),
            };
            format!(
                "マンダラチャートの作成中。\n\
                 {context}を達成するための8つの具体的な行動（ToDo）を日本語で挙げてください。\n\
                 各項目は簡潔に、**20文字以内**に収めてください。\n\
                 出力はJSON配列形式（[\"項目1\", \"項目2\", ...]）のみにしてください。"
            )
        }
        FillMode::Single => format!(
            "マンダラチャートのメインテーマ「{main_theme}」に関連する、目標達成のための具体的な行動を1つ提案してください。\n\
             20文字以内で、JSON形式 {{ \"suggestion\": \"...\" }} で出力してください。"
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdviceSummary<'a> {
    main_theme: &'a str,
    sub_themes: Vec<AdviceSubTheme<'a>>,
}

#[derive(Serialize)]
struct AdviceSubTheme<'a> {
    theme: &'a str,
    actions: Vec<&'a str>,
}

/// Compact JSON summary of the filled part of a chart.
///
/// Empty sub-themes are omitted, and so are empty actions.
pub fn chart_summary_json(grid: &Grid) -> String {
    let sub_themes = SATELLITE_BLOCKS
        .iter()
        .filter_map(|&block| {
            let theme = grid.sub_theme(block).ok().filter(|theme| !theme.is_empty())?;
            let actions = grid
                .actions(block)
                .ok()?
                .map(|(_, action)| action)
                .filter(|action| !action.is_empty())
                .collect();
            Some(AdviceSubTheme { theme, actions })
        })
        .collect();
    let summary = AdviceSummary {
        main_theme: grid.main_theme(),
        sub_themes,
    };
    serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string())
}

/// Builds the coaching prompt for the whole chart.
pub fn advice_prompt(grid: &Grid) -> String {
    format!(
        "あなたはプロの目標達成コーチです。以下のマンダラチャートの内容を分析し、ユーザーへのフィードバックを行ってください。\n\
         【入力データ】\n\
         {}\n\
         【依頼事項】\n\
         以下の構成で、親しみやすく、かつ洞察に富んだアドバイスを日本語で作成してください。\n\
         1. **全体的な印象**: チャートの完成度や目標のバランスについて（ポジティブに）。\n\
         2. **良い点**: 具体的に優れている点やユニークな点を1つ。\n\
         3. **改善のヒント**: より達成率を高めるための具体的なアドバイスを箇条書きで3つ。\n\
         4. **励ましのメッセージ**: 最後に一言。\n\
         ※マークダウン形式で見やすく整形してください。",
        chart_summary_json(grid)
    )
}

#[cfg(test)]
mod tests {
    use super::{chart_summary_json, fill_prompt, FillMode};
    use crate::model::grid::Grid;
    use crate::model::layout::global_index;

    #[test]
    fn block_prompt_prefers_topic() {
        let prompt = fill_prompt(FillMode::Block, "健康", Some("睡眠"));
        assert!(prompt.contains("サブテーマ「睡眠」"));
        let fallback = fill_prompt(FillMode::Block, "健康", Some(""));
        assert!(fallback.contains("メインテーマ「健康」に関連する要素"));
    }

    #[test]
    fn summary_skips_empty_entries() {
        let mut grid = Grid::new();
        grid.set_main_theme("Health");
        grid.set_sub_theme(3, "Diet").unwrap();
        grid.set_cell(global_index(3, 0), "Eat vegetables").unwrap();
        grid.set_cell(global_index(5, 0), "orphan action").unwrap();

        let json: serde_json::Value = serde_json::from_str(&chart_summary_json(&grid)).unwrap();
        assert_eq!(json["mainTheme"], "Health");
        assert_eq!(json["subThemes"].as_array().unwrap().len(), 1);
        assert_eq!(json["subThemes"][0]["actions"][0], "Eat vegetables");
    }

    #[test]
    fn mode_parse_accepts_spellings() {
        assert_eq!(FillMode::parse("sub-themes"), Some(FillMode::SubThemes));
        assert_eq!(FillMode::parse("FULL"), Some(FillMode::Full));
        assert_eq!(FillMode::parse("all"), None);
    }
}
