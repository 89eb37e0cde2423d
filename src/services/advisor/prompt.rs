//! Prompt construction for the suggestion service, one shape per report type.

use crate::services::learning::{
    LearningReport, ModifierPerformanceReport, PatternDiscoveryReport, StrategyAnalysisReport,
    SystemInfo,
};

pub fn build_prompt(report: &LearningReport) -> String {
    match report {
        LearningReport::StrategyAnalysis(report) => strategy_prompt(report),
        LearningReport::ModifierPerformance(report) => modifier_prompt(report),
        LearningReport::PatternDiscovery(report) => pattern_prompt(report),
    }
}

fn prompt_header(prompt: &mut String, system_info: &SystemInfo) {
    prompt.push_str("You are an advisor tuning a weighted text-matching engine for shaving brushes. ");
    prompt.push_str("Reviewers validate or override the engine's picks; the statistics below summarize their verdicts. ");
    prompt.push_str("Output ONLY a pure JSON object in the reply shape requested at the end.\n\n");
    prompt.push_str(&format!(
        "## System\n- type: {}\n- version: {}\n",
        system_info.system_type, system_info.version
    ));
}

fn strategy_prompt(report: &StrategyAnalysisReport) -> String {
    let mut prompt = String::new();
    prompt_header(&mut prompt, &report.system_info);

    prompt.push_str("\n## Strategy performance\n");
    for (name, stats) in &report.strategies {
        prompt.push_str(&format!(
            "- {}: {} selections, {} validated, {} overridden, win rate {:.1}%, avg score {:.1}\n",
            name,
            stats.total_selections,
            stats.validated_selections,
            stats.overridden_selections,
            stats.win_rate,
            stats.avg_score
        ));
    }

    prompt.push_str("\n## Reply shape\n");
    prompt.push_str("{\"weight_adjustments\": {\"<strategy>\": <new_base_weight>}, \"reasoning\": \"<short justification>\"}\n");
    prompt.push_str("Only include strategies whose weight should change.\n");
    prompt
}

fn modifier_prompt(report: &ModifierPerformanceReport) -> String {
    let mut prompt = String::new();
    prompt_header(&mut prompt, &report.system_info);

    prompt.push_str("\n## Modifier performance\n");
    for (name, stats) in &report.modifiers {
        prompt.push_str(&format!(
            "- {}: {} validated, {} overridden, validation rate {:.2}, avg value {:.1}\n",
            name, stats.validated, stats.overridden, stats.validation_rate, stats.avg_value
        ));
    }

    prompt.push_str("\n## Reply shape\n");
    prompt.push_str("{\"modifier_adjustments\": {\"<modifier>\": <new_value>}, \"reasoning\": \"<short justification>\"}\n");
    prompt.push_str("Only include modifiers whose value should change.\n");
    prompt
}

fn pattern_prompt(report: &PatternDiscoveryReport) -> String {
    let mut prompt = String::new();
    prompt_header(&mut prompt, &report.system_info);

    prompt.push_str(&format!(
        "\n## Overridden inputs ({} total)\n### Keyword frequencies\n",
        report.overridden_total
    ));
    for (keyword, count) in &report.keyword_counts {
        prompt.push_str(&format!("- {keyword}: {count}\n"));
    }

    prompt.push_str("\n### Delimiter override rates\n");
    for (delimiter, rate) in &report.delimiter_rates {
        prompt.push_str(&format!("- {delimiter}: {rate:.2}\n"));
    }

    prompt.push_str("\n## Reply shape\n");
    prompt.push_str("{\"suggested_new_modifiers\": [{\"name\": \"<modifier>\", \"pattern\": \"<substring or regex>\", \"suggested_weights\": {\"<strategy>\": <weight>}, \"test_cases\": [\"<example input>\"]}], \"reasoning\": \"<short justification>\"}\n");
    prompt.push_str("Suggest modifiers only for patterns frequent enough to matter.\n");
    prompt
}
