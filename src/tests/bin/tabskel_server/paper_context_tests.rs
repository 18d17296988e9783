use super::*;

fn touch(path: &FsPath, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[test]
fn unmasked_pdf_wins_and_sidecar_text_is_read() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("a_paper.pdf"), "%PDF");
    touch(&dir.path().join("nomask_paper.pdf"), "%PDF");
    touch(&dir.path().join("nomask_paper.txt"), "Table 2 reports wages.");
    touch(&dir.path().join("nested/deep.pdf"), "%PDF");

    let pdf = find_pdf(dir.path()).unwrap();
    assert!(pdf.ends_with("nomask_paper.pdf"));
    assert_eq!(read_pdf_text(&pdf), "Table 2 reports wages.");
    assert_eq!(read_pdf_text(&dir.path().join("a_paper.pdf")), "");
}

#[test]
fn data_headers_and_code_identifiers_become_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("data/panel.csv"), "firm_id,log_wage, treated \n1,2.0,1\n");
    touch(&root.join("data/extra.tsv"), "year\tregion\n2001\tNE\n");
    touch(&root.join("data/broken.xlsx"), "not a workbook");
    touch(&root.join("code/main.do"), "reg log_wage treated i.year, cluster(firm_id)\n");
    touch(&root.join("code/run.log"), "should_not_appear\n");
    touch(&root.join("code/build_log.py"), "also_not_here = 1\n");

    let ctx = PaperContext::load(root).unwrap();
    assert_eq!(
        ctx.candidate_columns,
        vec!["firm_id", "log_wage", "region", "treated", "year"]
    );
    assert!(ctx.candidate_code_vars.contains(&"log_wage".to_string()));
    assert!(ctx.candidate_code_vars.contains(&"i.year".to_string()));
    assert!(ctx.candidate_code_vars.contains(&"cluster".to_string()));
    assert!(!ctx.candidate_code_vars.contains(&"also_not_here".to_string()));
    assert!(!ctx.candidate_code_vars.iter().any(|v| v.starts_with("should")));
    assert!(ctx.pdf_path.is_none());
    assert!(ctx.pdf_text.is_empty());
}

#[test]
fn long_code_names_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let long = "x".repeat(61);
    let path = dir.path().join("a.py");
    touch(&path, &format!("{} = short_name\n", long));

    let vars = code_vars(&[&path]).unwrap();
    assert_eq!(vars, vec!["short_name"]);
}
