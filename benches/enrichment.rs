use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rayon::prelude::*;

use pathmech::interactome::InteractomeBuilder;
use pathmech::source::GeneRecord;
use pathmech::stats::EnrichmentEngine;
use pathmech::{
    CancellationToken, Config, DiseaseId, FunctionalCategory, GeneCatalog, Pipeline, RuleTable,
};

const PREFIXES: [&str; 8] = ["NDUF", "PSM", "GRIN", "CASP", "ATG", "SYN", "GENE", "LOC"];

/// 40 diseases with 250 genes each, drawn from a pool of 3000 genes
fn catalog() -> GeneCatalog {
    let mut catalog = GeneCatalog::default();
    for disease in 0..40u32 {
        let records: Vec<GeneRecord> = (0..250u32)
            .map(|i| {
                let gene = (disease * 67 + i * 13) % 3000;
                GeneRecord::new(
                    &gene.to_string(),
                    &format!("{}{}", PREFIXES[(gene % 8) as usize], gene),
                    &format!("hsa{:05}", 4000 + gene % 25),
                )
            })
            .collect();
        catalog.ingest(DiseaseId::from(disease + 1), "Disease", &records);
    }
    catalog
}

fn enrichment_sequential(catalog: &GeneCatalog, config: &Config) -> usize {
    let background = catalog.background();
    let engine = EnrichmentEngine::new(&background, config.alpha);
    catalog
        .diseases()
        .map(|disease| {
            engine
                .enrich_disease(catalog, disease.id(), &FunctionalCategory::ALL)
                .map_or(0, |results| results.iter().filter(|r| r.significant()).count())
        })
        .sum()
}

fn enrichment_parallel(catalog: &GeneCatalog, config: &Config) -> usize {
    let background = catalog.background();
    let engine = EnrichmentEngine::new(&background, config.alpha);
    let diseases: Vec<DiseaseId> = catalog.diseases().map(|disease| *disease.id()).collect();
    diseases
        .par_iter()
        .map(|disease| {
            engine
                .enrich_disease(catalog, disease, &FunctionalCategory::ALL)
                .map_or(0, |results| results.iter().filter(|r| r.significant()).count())
        })
        .sum()
}

fn interactome_sequential(catalog: &GeneCatalog, config: &Config) -> usize {
    let builder = InteractomeBuilder::new(config);
    catalog
        .diseases()
        .map(|disease| {
            builder
                .build_disease(catalog, disease.id())
                .map_or(0, |graph| graph.edges().len())
        })
        .sum()
}

fn enrichment_benchmark(c: &mut Criterion) {
    let rules = RuleTable::default_neuro().unwrap();
    let config = Config::default();
    let pipeline = Pipeline::new(config.clone(), rules).unwrap();
    let mut catalog = catalog();
    pipeline.run(&mut catalog, &CancellationToken::new());

    c.bench_function("enrichment sequential", |b| {
        b.iter(|| enrichment_sequential(black_box(&catalog), black_box(&config)))
    });
    c.bench_function("enrichment parallel", |b| {
        b.iter(|| enrichment_parallel(black_box(&catalog), black_box(&config)))
    });
    c.bench_function("interactome sequential", |b| {
        b.iter(|| interactome_sequential(black_box(&catalog), black_box(&config)))
    });
    c.bench_function("full batch", |b| {
        b.iter(|| {
            pipeline
                .analyze(black_box(&catalog), &CancellationToken::new())
                .len()
        })
    });
}

criterion_group! {
    name = enrichment;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(10));
    targets = enrichment_benchmark
}
criterion_main!(enrichment);
