//! Table fixtures and a mock download host

use flate2::Compression;
use flate2::write::GzEncoder;
use known_canonical::Config;
use std::io::Write;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a 12-column knownGene line from the fields the pipeline reads
pub fn gene_line(name: &str, start: &str, end: &str, exons: &str, id: &str) -> String {
    [
        name, "chr1", "+", start, end, start, end, exons, "1,", "2,", "", id,
    ]
    .join("\t")
}

/// Build a 6-column knownCanonical line naming `id` as canonical
pub fn canonical_line(id: &str) -> String {
    ["chr1", "11873", "14409", "1", id, "NR_046018"].join("\t")
}

/// Join lines into newline-terminated table text
pub fn table(lines: &[String]) -> String {
    lines.iter().map(|l| format!("{l}\n")).collect()
}

/// gzip-compress `text`
pub fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// Serve both tables for `assembly` from a fresh mock server
pub async fn serve_tables(assembly: &str, known_gene: &str, known_canonical: &str) -> MockServer {
    let server = MockServer::start().await;
    serve(
        &server,
        assembly,
        "knownGene.txt.gz",
        ResponseTemplate::new(200).set_body_bytes(gzip(known_gene)),
    )
    .await;
    serve(
        &server,
        assembly,
        "knownCanonical.txt.gz",
        ResponseTemplate::new(200).set_body_bytes(gzip(known_canonical)),
    )
    .await;
    server
}

/// Mount one response for a table file
pub async fn serve(server: &MockServer, assembly: &str, file: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/{assembly}/database/{file}")))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Config pointing at `server`, writing into `dir`
pub fn config_for(server: &MockServer, dir: &Path) -> Config {
    Config {
        base_url: server.uri(),
        output: Some(dir.join("knownGeneCanonical.txt.hg19")),
        ..Default::default()
    }
}

/// Entries left in `dir` other than the output file
pub fn leftovers(dir: &Path, output: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").path())
        .filter(|p| p != output)
        .map(|p| p.display().to_string())
        .collect()
}
