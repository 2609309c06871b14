// Prompts for recommendation enrichment.

pub const CRITIQUE_SYSTEM: &str = "You are an expert technical recruiter who reviews résumés \
    for compatibility with Applicant Tracking Systems.";

/// Filled with `{resume_text}`, `{job_description}`, `{overall}` and `{missing_keywords}`.
pub const CRITIQUE_PROMPT_TEMPLATE: &str = r#"Review the résumé below against the job description.

RÉSUMÉ:
{resume_text}

JOB DESCRIPTION:
{job_description}

An automated check scored the résumé {overall}/100. Keywords from the job description that the résumé lacks: {missing_keywords}.

Write your critique as separate paragraphs divided by one blank line, in this order:
1. A short overall summary of the fit (no heading).
2. A paragraph headed "Improvements:" with up to 5 concrete improvements, one per line.
3. A paragraph headed "Bullet rewrites:" with up to 3 rewritten achievement bullets, one per line.
4. A paragraph headed "Skills to add:" listing missing skills, one per line.
5. A paragraph headed "ATS tips:" with formatting tips, one per line."#;
