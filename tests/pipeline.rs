//! End-to-end runs against a mock download host

mod common;

use common::*;
use known_canonical::{Error, FetchError, HEADER, Stage, run};
use wiremock::ResponseTemplate;

fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn joins_canonical_transcripts_to_coordinates() {
    let genes = table(&[
        gene_line("uc002zzz.1", "500", "900", "7", "uc002zzz.1"),
        gene_line("chr1", "1000", "2000", "4", "id123"),
        gene_line("uc001aaa.3", "11873", "14409", "3", "uc001aaa.3"),
    ]);
    let canonical = table(&[
        canonical_line("uc001aaa.3"),
        canonical_line("id123"),
        canonical_line("id999"),
    ]);
    let server = serve_tables("hg19", &genes, &canonical).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let summary = run(&config).await.unwrap();

    let lines = read_lines(&config.output_path());
    assert_eq!(
        lines,
        [HEADER, "chr1 4 1000 2000", "uc001aaa.3 3 11873 14409"]
    );
    assert_eq!(summary.line_count, 3);
    assert_eq!(summary.preview, lines);
    assert_eq!(summary.counts.canonical, 3);
    assert_eq!(summary.counts.genes, 3);
    assert_eq!(summary.counts.joined, 2);
    assert_eq!(summary.counts.unique, 2);
    assert!(
        leftovers(dir.path(), &config.output_path()).is_empty(),
        "working directory must be removed"
    );
}

#[tokio::test]
async fn duplicate_canonical_ids_collapse_to_one_line() {
    let genes = table(&[gene_line("uc1", "10", "20", "2", "k")]);
    let canonical = table(&[canonical_line("k"), canonical_line("k")]);
    let server = serve_tables("hg19", &genes, &canonical).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let summary = run(&config).await.unwrap();

    assert_eq!(summary.counts.joined, 2);
    assert_eq!(read_lines(&config.output_path()), [HEADER, "uc1 2 10 20"]);
}

#[tokio::test]
async fn empty_canonical_table_writes_header_only() {
    let genes = table(&[gene_line("uc1", "10", "20", "2", "k")]);
    let server = serve_tables("hg19", &genes, "").await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let summary = run(&config).await.unwrap();

    assert_eq!(
        std::fs::read_to_string(config.output_path()).unwrap(),
        format!("{HEADER}\n")
    );
    assert_eq!(summary.line_count, 1);
}

#[tokio::test]
async fn output_is_sorted_unique_and_sound() {
    let ids = ["t05", "t01", "t04", "t02", "t03", "t02"];
    let genes = table(
        &ids.iter()
            .enumerate()
            .map(|(i, id)| gene_line(&format!("n{}", 9 - i), "1", "2", "1", id))
            .collect::<Vec<_>>(),
    );
    let canonical = table(&[
        canonical_line("t02"),
        canonical_line("t04"),
        canonical_line("t05"),
        canonical_line("t04"),
        canonical_line("missing"),
    ]);
    let server = serve_tables("hg19", &genes, &canonical).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    run(&config).await.unwrap();

    let lines = read_lines(&config.output_path());
    assert_eq!(lines[0], HEADER);
    let body = &lines[1..];
    let firsts: Vec<&str> = body.iter().map(|l| l.split(' ').next().unwrap()).collect();
    assert!(firsts.windows(2).all(|w| w[0] <= w[1]), "unsorted: {body:?}");
    let mut unique = body.to_vec();
    unique.dedup();
    assert_eq!(unique.len(), body.len(), "duplicates in {body:?}");
    // t05 is gene row 0, t04 row 2, t02 rows 3 and 5
    assert_eq!(body, ["n4 1 1 2", "n6 1 1 2", "n7 1 1 2", "n9 1 1 2"]);
    assert!(body.iter().all(|l| l.split(' ').count() == 4));
}

#[tokio::test]
async fn reruns_are_byte_identical() {
    let genes = table(&[
        gene_line("uc2", "30", "40", "5", "b"),
        gene_line("uc1", "10", "20", "2", "a"),
    ]);
    let canonical = table(&[canonical_line("b"), canonical_line("a")]);
    let server = serve_tables("hg19", &genes, &canonical).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    run(&config).await.unwrap();
    let first = std::fs::read(config.output_path()).unwrap();
    run(&config).await.unwrap();
    let second = std::fs::read(config.output_path()).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn short_gene_row_aborts_without_output() {
    let genes = table(&[
        gene_line("uc1", "10", "20", "2", "a"),
        ["chr1", "name", "+", "1000", "2000"].join("\t"),
    ]);
    let canonical = table(&[canonical_line("a")]);
    let server = serve_tables("hg19", &genes, &canonical).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let err = run(&config).await.unwrap_err();

    match &err {
        Error::MalformedRow(e) => {
            assert_eq!(e.table, "knownGene");
            assert_eq!(e.line, 2);
        }
        other => panic!("expected malformed row, got {other:?}"),
    }
    assert_eq!(err.stage(), Stage::Decompress);
    assert!(!config.output_path().exists());
    assert!(
        leftovers(dir.path(), &config.output_path()).is_empty(),
        "working directory must be removed after failure"
    );
}

#[tokio::test]
async fn missing_table_aborts_without_output() {
    let server = wiremock::MockServer::start().await;
    serve(
        &server,
        "hg19",
        "knownCanonical.txt.gz",
        ResponseTemplate::new(200).set_body_bytes(gzip(&canonical_line("a"))),
    )
    .await;
    serve(&server, "hg19", "knownGene.txt.gz", ResponseTemplate::new(503)).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());

    let err = run(&config).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Fetch(FetchError::Status { status: 503, .. })
    ));
    assert_eq!(err.stage(), Stage::Fetch);
    assert!(!config.output_path().exists());
    assert!(leftovers(dir.path(), &config.output_path()).is_empty());
}

#[tokio::test]
async fn failed_run_keeps_previous_output() {
    let server = wiremock::MockServer::start().await;
    serve(&server, "hg19", "knownCanonical.txt.gz", ResponseTemplate::new(200)).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, dir.path());
    std::fs::write(config.output_path(), "previous\n").unwrap();

    let err = run(&config).await.unwrap_err();

    assert_eq!(err.error_code(), "fetch_empty");
    assert_eq!(
        std::fs::read_to_string(config.output_path()).unwrap(),
        "previous\n"
    );
}

#[tokio::test]
async fn assembly_selects_download_path() {
    let genes = table(&[gene_line("uc1", "10", "20", "2", "a")]);
    let canonical = table(&[canonical_line("a")]);
    let server = serve_tables("hg38", &genes, &canonical).await;
    let dir = tempfile::tempdir().unwrap();
    let config = known_canonical::Config {
        assembly: "hg38".into(),
        base_url: server.uri(),
        temp_dir: Some(dir.path().to_path_buf()),
        output: Some(dir.path().join("knownGeneCanonical.txt.hg38")),
        ..Default::default()
    };

    let summary = run(&config).await.unwrap();

    assert_eq!(summary.output, dir.path().join("knownGeneCanonical.txt.hg38"));
    assert_eq!(read_lines(&summary.output), [HEADER, "uc1 2 10 20"]);
}

#[tokio::test]
async fn invalid_config_fails_before_download() {
    let dir = tempfile::tempdir().unwrap();
    let config = known_canonical::Config {
        assembly: "hg19/../x".into(),
        output: Some(dir.path().join("out")),
        ..Default::default()
    };

    let err = run(&config).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Setup);
    assert!(leftovers(dir.path(), &config.output_path()).is_empty());
}
