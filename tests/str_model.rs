use std::{fs, path::Path};

use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;
use tempfile::TempDir;

use stutter::{
    allele::Allele,
    cli::{Config, cli_model},
    compose::Composer,
    likelihoods::AlleleLikelihoods,
    model::{ModelConfig, StrModel},
    process::process_data,
    reference::RefContext,
};

const HEADER: &str = "unit_length\tparameter\tmaximum\tintercept\trepeat_count_coef\n";

fn entries(unit: &str) -> String {
    format!(
        "{u}\tPI\t0.99\t3.0\t-0.12\n{u}\tTAU\t0.4\t-0.5\t0.02\n\
         {u}\tDEL\t1\t0.6\t0.01\n{u}\tINS\t1\t-0.6\t0\n",
        u = unit
    )
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let p = dir.path().join(name);
    fs::write(&p, content).unwrap();
    p
}

fn load(p: &Path) -> anyhow::Result<StrModel> {
    StrModel::load(ModelConfig {
        parameter_file: Some(p.to_owned()),
        ..Default::default()
    })
}

#[test]
fn load_and_use_model() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_file(&dir, "model.txt", &format!("{}{}{}", HEADER, entries("1"), entries("2+")));
    let model = load(&p).unwrap();
    assert!(!model.is_null());
    assert_eq!(model.max_unit_length(), 2);
    assert!(model.calculator_for(0).is_null());
    for ul in 1..=2 {
        let c = model.calculator_for(ul);
        for r in 0..25 {
            assert!(c.log10_coefficient(r, r) <= 0.0);
            let tot: f64 = (0..r + 200).map(|j| 10f64.powf(c.log10_coefficient(r, j))).sum();
            assert_abs_diff_eq!(tot, 1.0, epsilon = 1.0e-8);
        }
    }
    // Longer units fall back to the longest unit length in the table
    assert_eq!(
        model.calculator_for(10).log10_coefficient(6, 7),
        model.calculator_for(2).log10_coefficient(6, 7)
    );
}

#[test]
fn invalid_model_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = entries("2").replace("2\tINS\t1\t-0.6\t0\n", "");
    let p = write_file(&dir, "missing.txt", &format!("{}{}{}", HEADER, entries("1"), missing));
    let e = format!("{:#}", load(&p).unwrap_err());
    assert!(e.contains("missing: (2, INS)"), "{}", e);

    let p = write_file(
        &dir,
        "plus.txt",
        &format!("{}{}{}{}", entries("1"), entries("2"), entries("3+"), entries("4")),
    );
    let e = format!("{:#}", load(&p).unwrap_err());
    assert!(e.contains("is not the one declared with a '+'"), "{}", e);

    assert!(load(&dir.path().join("no_such_file.txt")).is_err());
}

#[test]
fn transform_through_model() {
    let dir = tempfile::tempdir().unwrap();
    let p = write_file(&dir, "model.txt", &format!("{}{}{}", HEADER, entries("1"), entries("2")));
    let model = load(&p).unwrap();
    let null = StrModel::null(ModelConfig::default());

    let rc = RefContext::new("chr5", 1000, 998, b"TTGCACACACACACAGTT").unwrap();
    let ref_allele = Allele::reference(b"G");
    let alleles = vec![ref_allele.clone(), Allele::alternate(b"GCA"), Allele::non_ref()];
    let m = DMatrix::from_row_slice(3, 3, &[-0.1, -1.5, -3.0, -2.0, -0.3, -3.0, -0.2, -0.2, -3.0]);
    let lk = AlleleLikelihoods::new(alleles, &["NA12878"], vec![m]).unwrap();

    let mut composer = Composer::new(&null).unwrap();
    let ctx = composer.compose_from_likelihoods(&rc, &lk).unwrap().unwrap();
    composer.finish().unwrap();

    let id = null.transform_likelihoods(&ctx, &ref_allele).unwrap();
    assert_eq!(id.alleles()[0], ref_allele);
    assert_eq!(id.alleles()[1].bases(), b"GCA");
    assert_eq!(id.sample_matrix(0), ctx.likelihoods().unwrap().sample_matrix(0));

    let t = model.transform_likelihoods(&ctx, &ref_allele).unwrap();
    let mat = model.log10_transformation_matrix(&ctx);
    let s = ctx.likelihoods().unwrap().sample_matrix(0);
    let ts = t.sample_matrix(0);
    for e in 0..3 {
        for i in 0..2 {
            let x: f64 = (0..2).map(|j| 10f64.powf(mat[(i, j)] + s[(e, j)])).sum();
            assert_abs_diff_eq!(ts[(e, i)], x.log10(), epsilon = 1.0e-10);
        }
    }
}

#[test]
fn scan_reference_and_sites() {
    let dir = tempfile::tempdir().unwrap();
    let fasta = write_file(&dir, "ref.fa", ">chr1 test\nTTGCACACACACACAGTT\nACGATCGATGC\n");
    let model_txt = format!("{}{}{}", HEADER, entries("1"), entries("2"));
    let model_file = write_file(&dir, "model.txt", &model_txt);
    let out = dir.path().join("report.txt");
    let log = dir.path().join("str.log");
    let sites = write_file(
        &dir,
        "sites.txt",
        "#contig\tpos\nchr1\t3\tGCA\tG,GCACA\nchr1\t20\nchr1\t3\n",
    );

    let arg = |p: &Path| p.to_str().unwrap().to_owned();
    let m = cli_model()
        .try_get_matches_from(["stutter", "-T", &arg(&fasta), "-r", "chr1", "-o", &arg(&out)])
        .unwrap();
    process_data(Config::from_matches(&m).unwrap()).unwrap();
    let report = fs::read_to_string(&out).unwrap();
    let lines: Vec<_> = report.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("contig\tpos\tunit"));
    assert_eq!(lines[1], "chr1\t3\tCA\t2\t6\t12\t6\t1.000000");

    let m = cli_model()
        .try_get_matches_from([
            "stutter",
            "-T",
            &arg(&fasta),
            "-s",
            &arg(&sites),
            "-m",
            &arg(&model_file),
            "--str-log",
            &arg(&log),
            "-o",
            &arg(&out),
        ])
        .unwrap();
    process_data(Config::from_matches(&m).unwrap()).unwrap();
    let report = fs::read_to_string(&out).unwrap();
    let lines: Vec<_> = report.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("chr1\t3\tCA\t2\t6\t12\t5,6,7\t"));
    assert!(lines[2].starts_with("chr1\t3\tCA\t2\t6\t12\t6\t"));
    let p: f64 = lines[1].rsplit('\t').next().unwrap().parse().unwrap();
    assert!(p > 0.0 && p < 1.0);

    // Only the site with alleles goes to the STR log
    let log_txt = fs::read_to_string(&log).unwrap();
    assert_eq!(log_txt.lines().collect::<Vec<_>>(), vec!["chr1\t3\tCA\t2\t6\t5,6,7\t.\t."]);

    assert!(
        cli_model()
            .try_get_matches_from(["stutter", "-T", &arg(&fasta), "-r", "chr1", "-s", &arg(&sites)])
            .is_err()
    );
}
