// All LLM prompt constants for resume tailoring.
// Kept next to the engine so the output contract and the fence stripping
// that enforces it live in the same module tree.

/// System prompt for chat-completion providers.
pub const LATEX_SYSTEM: &str =
    "You are an expert LaTeX resume writer. Output only valid LaTeX code with no explanations.";

/// Tailoring prompt template. Replace `{cv_text}` and `{job_description}`
/// before sending.
pub const TAILORING_PROMPT_TEMPLATE: &str = r#"You are an expert resume writer and LaTeX specialist. Your task is to create a tailored, professional resume in LaTeX format.

**FULL CV CONTENT:**
{cv_text}

**JOB DESCRIPTION:**
{job_description}

**INSTRUCTIONS:**
1. Analyze the job description and identify key requirements, skills, and qualifications
2. Use the CV content as your ONLY source material — do not invent experience
3. Emphasize and prioritize experiences, skills, and achievements that match the job requirements
4. Reorganize and reword bullet points to align with the job description keywords
5. Keep the resume concise (1-2 pages maximum)
6. Use a clean, professional LaTeX resume template with standard packages (geometry, enumitem, hyperref)
7. Include sections: Contact Info, Summary, Experience, Education, Skills, and any other relevant sections from the CV

**OUTPUT REQUIREMENTS:**
- Return ONLY the complete LaTeX document code
- Start with \documentclass and end with \end{document}
- Make it compile-ready
- NO markdown code fences, NO explanations, NO preamble
- Just pure LaTeX code"#;

/// Builds the tailoring prompt. Pure function of its two inputs.
pub fn build_tailoring_prompt(cv_text: &str, job_description: &str) -> String {
    TAILORING_PROMPT_TEMPLATE
        .replace("{cv_text}", cv_text)
        .replace("{job_description}", job_description)
}
