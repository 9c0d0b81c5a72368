// Prompt for the resume feedback generation call.
// The section headings are taken from `extraction::sections` so the document the
// model writes can always be sliced back into the four wizard sections.

use crate::extraction::sections::{
    BREAKDOWN_HEADING, COVER_LETTER_HEADING, REFINED_COPY_HEADING, SUMMARY_HEADING,
};
use crate::models::resume::ResumeInputs;

const ROLE_PREAMBLE: &str = "You are an expert career coach and professional resume writer \
    with over 20 years of experience helping candidates land jobs at top companies.";

const SUMMARY_INSTRUCTIONS: &str = "Start with a brief, high-level summary that works as a \
    compelling teaser for the full analysis. Highlight 1-2 key strengths of the resume, then \
    clearly identify 2-3 specific, high-impact areas where it falls short (for example: lacks \
    quantifiable achievements, not optimized for ATS keywords, summary is not tailored).\n\n\
    **After identifying the gaps, give 2-3 immediate, tangible action items the user can apply \
    right now.** Make them specific (for example: add metrics to the top 3 achievements using \
    'Achieved [X] by doing [Y], resulting in [Z]%'; replace 'responsible for' with action verbs \
    such as 'Led' or 'Optimized').\n\n\
    Frame these as immediate opportunities and state explicitly that the step-by-step \
    solutions, rewritten examples and a fully revised resume are available in the full analysis.";

const BREAKDOWN_INSTRUCTIONS: &str = "Provide specific, bullet-pointed feedback for each major \
    section of the resume. For each point, explain why the change is recommended and give an \
    improved example where possible.\n\
    - **Summary/Objective:** Analyze its effectiveness and suggest a more impactful version aligned with the user's goals.\n\
    - **Experience:** Rephrase bullet points using the STAR (Situation, Task, Action, Result) method and quantify achievements.\n\
    - **Skills:** Recommend skills to add or remove based on the goals and suggest grouping them into categories.\n\
    - **Education/Certifications:** Comment on placement and relevance.";

const TAILORING_WITH_REQUIREMENTS: &str = "This is the most critical section. Give concrete \
    examples of how to tailor the language and content of the resume to the provided \
    requirements. Suggest specific keywords from the requirements to use throughout the resume. \
    Highlight gaps between the resume and the requirements and how to address them.";

const TAILORING_GENERAL: &str = "Give general advice on tailoring a resume for a target role. \
    Explain the importance of job-description keywords and of aligning the summary and \
    experience sections with an employer's needs, with examples for a hypothetical posting.";

const FINAL_POLISH_INSTRUCTIONS: &str = "Offer tips on formatting, grammar and overall \
    presentation so the resume reads professionally. Mention consistency in tense and formatting.";

const REFINED_COPY_TAILORING: &str = "**Tailoring rules:**\n\
    1. Identify the 5 most important requirements of the target position.\n\
    2. For each, reframe existing experience from the original resume to show how the candidate meets it, with specific examples and metrics.\n\
    3. Open with a professional summary aligned with the 3-5 most critical requirements, using exact keywords from the posting.\n\
    4. Reorder experience bullets to lead with the achievements most relevant to this role.\n\
    5. List skills in order of relevance, featuring every required tool the candidate actually has.\n\
    6. Where a requirement is not met directly, surface transferable skills and adjacent experience.\n\
    7. Mirror the terminology of the posting so the resume passes ATS screening.";

const COVER_LETTER_INSTRUCTIONS: &str = "Based on the resume and job details, write a compelling, \
    professional cover letter that highlights the most relevant skills and experience, expresses \
    enthusiasm for the role and ends with a clear call to action. Address it to \"Hiring Manager\" \
    if no contact is available. Keep it to 3-4 paragraphs, formatted as clean markdown.";

/// Builds the single prompt whose markdown answer feeds the wizard.
pub fn build_feedback_prompt(inputs: &ResumeInputs) -> String {
    let tailored = inputs.has_requirements();
    let mut prompt = String::with_capacity(inputs.resume.len() + inputs.goals.len() + 6000);

    prompt.push_str(ROLE_PREAMBLE);
    prompt.push_str(" Your task is to analyze the user's resume and stated career goals");
    if tailored {
        prompt.push_str(" and the requirements of their target position");
    }
    prompt.push_str(" and give actionable, specific, constructive feedback.\n\n");

    prompt.push_str(&format!(
        "**User's Current Resume:**\n---\n{}\n---\n\n**User's Career Goals:**\n---\n{}\n---\n\n",
        inputs.resume.trim(),
        inputs.goals.trim()
    ));
    if tailored {
        prompt.push_str(&format!(
            "**Target Position Requirements:**\n---\n{}\n---\n\n",
            inputs.requirements.trim()
        ));
    }

    prompt.push_str("Structure your feedback in the following sections using Markdown headings exactly as written. Be encouraging but direct");
    if tailored {
        prompt.push_str(", and weigh the target position requirements heavily");
    }
    prompt.push_str(".\n\n");

    push_section(&mut prompt, SUMMARY_HEADING, SUMMARY_INSTRUCTIONS);
    push_section(&mut prompt, BREAKDOWN_HEADING, BREAKDOWN_INSTRUCTIONS);
    push_section(
        &mut prompt,
        "Tailoring for the Target Role",
        if tailored {
            TAILORING_WITH_REQUIREMENTS
        } else {
            TAILORING_GENERAL
        },
    );
    push_section(&mut prompt, "Final Polish", FINAL_POLISH_INSTRUCTIONS);

    prompt.push_str("---\n");
    let mut refined = String::from(
        "Provide a complete, rewritten version of the resume based on all your recommendations, \
         as a clean copy the user can use directly",
    );
    if tailored {
        refined.push_str(", tailored to the target position requirements.\n\n");
        refined.push_str(REFINED_COPY_TAILORING);
    } else {
        refined.push('.');
    }
    refined.push_str("\n\nPresent it under this heading, formatted as clean markdown.");
    push_section(&mut prompt, REFINED_COPY_HEADING, &refined);

    prompt.push_str("---\n");
    push_section(&mut prompt, COVER_LETTER_HEADING, COVER_LETTER_INSTRUCTIONS);

    prompt
}

fn push_section(prompt: &mut String, heading: &str, body: &str) {
    prompt.push_str("### ");
    prompt.push_str(heading);
    prompt.push('\n');
    prompt.push_str(body);
    prompt.push_str("\n\n");
}
