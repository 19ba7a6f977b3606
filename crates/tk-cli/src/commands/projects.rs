//! Projects command for listing configured repositories.

use std::io::Write;

use anyhow::Result;
use tk_core::ProjectConfig;

use crate::analyzer::ProjectStatus;

pub fn run<W: Write>(writer: &mut W, projects: &[ProjectConfig]) -> Result<()> {
    if projects.is_empty() {
        writeln!(writer, "No projects configured.")?;
        return Ok(());
    }

    writeln!(writer, "Projects:")?;
    for project in projects {
        let status = ProjectStatus::check(&project.path);
        writeln!(
            writer,
            "- {}: {} ({status})",
            project.name,
            project.path.display()
        )?;
        if let Some(email) = project.author_filter() {
            writeln!(writer, "  author: {email}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_projects_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path().join("repo");
        std::fs::create_dir_all(repo.join(".git")).unwrap();
        let projects = vec![
            ProjectConfig::new("repo", &repo).with_author_email("me@example.com"),
            ProjectConfig::new("plain", dir.path()),
            ProjectConfig::new("gone", dir.path().join("gone")),
        ];

        let mut output = Vec::new();
        run(&mut output, &projects).unwrap();
        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&dir.path().display().to_string(), "[TEMP]");

        insta::assert_snapshot!(output, @r"
        Projects:
        - repo: [TEMP]/repo (ok)
          author: me@example.com
        - plain: [TEMP] (not a repository)
        - gone: [TEMP]/gone (path does not exist)
        ");
    }

    #[test]
    fn reports_empty_configuration() {
        let mut output = Vec::new();
        run(&mut output, &[]).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No projects configured.\n");
    }
}
