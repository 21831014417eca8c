use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use errorly::model::{Issue, Project};
use errorly::query::compile;
use errorly::search::IssueSearchEngine;
use errorly::storage::{IssueStore, ProjectStore, SqliteStorage};
use errorly::util::id::{Id, IdConfig, IdGenerator};
use errorly::webhook::sign;
use std::hint::black_box;

fn bench_id_generation(c: &mut Criterion) {
    let generator = IdGenerator::new(IdConfig::default()).unwrap();
    c.bench_function("id_next", |b| b.iter(|| black_box(generator.next())));
}

fn bench_query_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_compile");
    for query in [
        "",
        "is:open",
        "is:open assignee:@me sort:occurrences-desc sort:last_modified",
        "'is:resolved' from:42 \"sort:created_at-asc\" junk tokens here",
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(query.len()), query, |b, q| {
            b.iter(|| compile(black_box(q), Id(100)));
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let storage = SqliteStorage::open_memory().unwrap();
    let ids = IdGenerator::new(IdConfig::default()).unwrap();
    let project = Project::new(ids.next(), "Bench", Id(100));
    storage.insert_project(&project).unwrap();
    for n in 0..1_000 {
        let mut issue = Issue::new(ids.next(), project.id, format!("Error {n}"), "f()");
        issue.occurrences = n % 37 + 1;
        issue.starred = n % 11 == 0;
        storage.insert_issue(&issue).unwrap();
    }
    let engine = IssueSearchEngine::new(&storage);

    c.bench_function("search_1000_issues", |b| {
        b.iter(|| {
            engine
                .search(project.id, black_box("is:open sort:occurrences"), 2, Id::NONE)
                .unwrap()
        });
    });
}

fn bench_signing(c: &mut Criterion) {
    let body = vec![b'x'; 4096];
    c.bench_function("sign_4k_body", |b| b.iter(|| sign(black_box(&body), "s3cret")));
}

criterion_group!(
    benches,
    bench_id_generation,
    bench_query_compile,
    bench_search,
    bench_signing
);
criterion_main!(benches);
