//! Runs the full analysis for the neurodegenerative disease pathways
//! of an offline pathway dump and prints the results per disease
//!
//! ```text
//! cargo run --example batch -- [PATHWAY DUMP] [CONFIG TOML]
//! ```
//!
//! Set `RUST_LOG=debug` to see the individual enrichment tests.

use std::time::Duration;

use pathmech::source::{CachedSource, FetchCache, Retrying, TsvSource};
use pathmech::{
    CancellationToken, Config, DiseaseId, DiseaseReport, DiseaseStatus, GeneCatalog, GeneId, Pipeline,
    RuleTable,
};

const DISEASES: [(u32, &str); 5] = [
    (5016, "Huntington disease"),
    (5010, "Alzheimer disease"),
    (5012, "Parkinson disease"),
    (5014, "Amyotrophic lateral sclerosis"),
    (5020, "Prion disease"),
];

fn print_report(report: &DiseaseReport, catalog: &GeneCatalog) {
    println!("\n### {} ({}) ###", report.name(), report.disease());
    println!("Status: {:?}", report.status());
    if report.status() == DiseaseStatus::NoData {
        println!("Reason: {}", report.reason().unwrap_or_default());
        return;
    }
    println!(
        "Genes: {}\tCoverage: {:.2}\tSkipped records: {}",
        report.genes(),
        report.coverage(),
        report.skipped_records()
    );

    let symbol = |id: &GeneId| {
        catalog
            .gene(id)
            .map_or_else(|| id.to_string(), |gene| gene.symbol().to_string())
    };

    println!("Edges: {}", report.edges().len());
    let hubs: Vec<String> = report.hubs().iter().map(symbol).collect();
    println!("Hubs: {}", hubs.join(", "));

    println!("Category\tCount\tp-value\tadjusted\tfold");
    for result in report.enrichment() {
        println!(
            "{}\t{}\t{:e}\t{:e}\t{:.2}{}",
            result.category(),
            result.count(),
            result.pvalue(),
            result.adjusted_pvalue(),
            result.enrichment(),
            if result.significant() { "\t*" } else { "" }
        );
    }

    println!("Top targets:");
    for score in report.priorities().iter().take(5) {
        println!(
            "{}\t{:.3}\t(role {:.2}, literature {:.2})",
            score.symbol(),
            score.score(),
            score.functional_role(),
            score.literature_prevalence()
        );
    }
}

fn main() {
    simple_logger::init_with_env().unwrap();

    let mut args = std::env::args().skip(1);
    let dump = args
        .next()
        .unwrap_or_else(|| "data/demo_pathways.tsv".to_string());
    let config = args
        .next()
        .map(|path| Config::from_file(path).expect("invalid configuration"))
        .unwrap_or_default();

    let source = TsvSource::from_file(&dump).expect("unable to read the pathway dump");
    let source = CachedSource::new(
        Retrying::new(source, 3, Duration::from_millis(50)),
        FetchCache::new(Duration::from_secs(3600), 64),
    );

    let pipeline =
        Pipeline::new(config, RuleTable::default_neuro().unwrap()).expect("invalid configuration");

    let diseases: Vec<(DiseaseId, &str)> = DISEASES
        .iter()
        .map(|(id, name)| ((*id).into(), *name))
        .collect();
    let mut catalog = GeneCatalog::default();
    pipeline.ingest(&source, &mut catalog, &diseases);

    let batch = pipeline.run(&mut catalog, &CancellationToken::new());
    for report in batch.reports() {
        print_report(report, &catalog);
    }
}
