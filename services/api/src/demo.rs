use crate::infra::build_catalog;
use clap::Args;
use decision_engine::error::AppError;
use decision_engine::questionnaire::{
    read_answer_sheet, AnswerSheetEntry, DecisionService, InMemorySessionStore, QuestionCatalog,
    QuestionId, ResultEnvelope, ScoredResult, ScoringPolicy, SystemClock, ValueDomain,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct QuestionsArgs {
    /// Load questions from a JSON catalog instead of the built-in one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Print the catalog as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// CSV answer sheet with `question_id,value` rows
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Decision title recorded on the result
    #[arg(long, default_value = "Offline decision")]
    pub(crate) title: String,
    /// Load questions from a JSON catalog instead of the built-in one
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Print the scored result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Answer the risk questions pessimistically to show a blocked decision
    #[arg(long)]
    pub(crate) risky: bool,
}

type OfflineService = DecisionService<InMemorySessionStore>;

fn offline_service(catalog: QuestionCatalog) -> OfflineService {
    DecisionService::new(
        Arc::new(InMemorySessionStore::default()),
        catalog,
        ScoringPolicy::standard(),
        Arc::new(SystemClock),
    )
}

pub(crate) fn run_questions(args: QuestionsArgs) -> Result<(), AppError> {
    let catalog = build_catalog(args.catalog.as_deref())?;

    if args.json {
        match serde_json::to_string_pretty(catalog.questions()) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Catalog JSON unavailable: {err}"),
        }
        return Ok(());
    }

    println!("Question catalog ({} questions)", catalog.len());
    for (index, question) in catalog.questions().iter().enumerate() {
        println!(
            "{:>2}. [{}] {} (weight {:.1})",
            index + 1,
            question.category,
            question.text,
            question.weight
        );
        println!("    id: {}", question.id);
        match &question.domain {
            ValueDomain::Scale { min, max } => println!("    scale {min}-{max}"),
            ValueDomain::Choice { options } => {
                for option in options {
                    println!("    {:>2} = {}", option.value, option.label);
                }
            }
        }
        if let Some(hint) = &question.hint {
            println!("    hint: {hint}");
        }
    }

    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let catalog = build_catalog(args.catalog.as_deref())?;
    let entries = read_answer_sheet(&args.answers)?;
    let envelope = score_entries(offline_service(catalog), &args.title, &entries)?;

    if args.json {
        match serde_json::to_string_pretty(&envelope) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Result JSON unavailable: {err}"),
        }
    } else {
        render_result(&envelope.result);
    }
    Ok(())
}

pub(crate) fn score_entries(
    service: OfflineService,
    title: &str,
    entries: &[AnswerSheetEntry],
) -> Result<ResultEnvelope, AppError> {
    let started = service.start(title)?;
    for entry in entries {
        service.submit_answer(&started.session_id, &entry.question_id, entry.value)?;
    }
    Ok(service.result(&started.session_id)?)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = offline_service(QuestionCatalog::standard());
    let title = if args.risky {
        "Acquire a struggling competitor"
    } else {
        "Launch a customer referral programme"
    };

    println!("Guided decision demo: {title}");
    let started = service.start(title)?;
    println!(
        "- Session {} opened with {} questions",
        started.session_id, started.total_questions
    );

    let script = demo_answers(args.risky);
    let halfway = script.len() / 2;
    for (index, (question_id, value)) in script.into_iter().enumerate() {
        let receipt =
            service.submit_answer(&started.session_id, &QuestionId::new(question_id), value)?;
        println!(
            "  answered {:<24} = {:>2} | {}% complete",
            question_id, value, receipt.progress.percent_complete
        );

        if index + 1 == halfway {
            let provisional = service.result(&started.session_id)?;
            println!(
                "  provisional verdict after {} answers: {} (adjusted {})",
                provisional.result.total_answers,
                provisional.result.recommendation.decision.label(),
                provisional.result.recommendation.adjusted_score
            );
        }
    }

    let envelope = service.result(&started.session_id)?;
    println!();
    render_result(&envelope.result);

    let again = service.result(&started.session_id)?;
    println!(
        "\nSecond fetch served from cache: {}",
        if again.cached { "yes" } else { "no" }
    );
    Ok(())
}

fn demo_answers(risky: bool) -> Vec<(&'static str, i64)> {
    let (reversibility, downside, budget, capacity) =
        if risky { (2, 1, 2, 2) } else { (8, 7, 8, 7) };
    vec![
        ("feasibility-capability", 8),
        ("feasibility-dependencies", 8),
        ("risk-reversibility", reversibility),
        ("risk-downside", downside),
        ("impact-value", 9),
        ("impact-reach", 10),
        ("resources-budget", budget),
        ("resources-capacity", capacity),
        ("urgency-window", 5),
        ("urgency-cost-of-delay", 6),
    ]
}

pub(crate) fn render_result(result: &ScoredResult) {
    let recommendation = &result.recommendation;
    println!("Decision: {}", result.decision_title);
    println!(
        "Verdict: {} (opportunity {}, adjusted {})",
        recommendation.decision.label(),
        recommendation.opportunity_score,
        recommendation.adjusted_score
    );
    println!("  {}", recommendation.rationale);
    println!("  Next step: {}", recommendation.action);

    println!("Category scores:");
    for (category, score) in result.scores.iter() {
        println!("  - {:<12} {:>3}", category.as_str(), score);
    }

    println!(
        "Risk: {:?} (exposure {})",
        result.risk.severity, result.risk.effective_risk_score
    );
    for flag in &result.risk.flags {
        println!("  ! {}", flag.message());
    }
    for warning in &result.risk.warnings {
        println!("  ~ {:?}", warning);
    }
    println!(
        "Confidence: {} ({:?}) from {} answers",
        result.confidence.score, result.confidence.label, result.total_answers
    );
}
