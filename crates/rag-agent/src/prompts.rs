//! System prompt constants for each `LlmOracle` operation.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content
//! changes, so traces can record which prompt version produced a given
//! oracle reply.

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.0.0";

/// Preamble for the rewrite operation (N2). Must return the rewritten query
/// text and nothing else — no markdown, no preface.
pub const REWRITE_PREAMBLE: &str = "\
You rewrite user queries for retrieval and answering. Expand abbreviations, \
resolve ambiguous pronouns using context already present in the query, and \
fold in any enhancement hints you are given from a prior unsuccessful attempt. \
Respond with ONLY the rewritten query text — no explanation, no quotes, no \
markdown formatting.
";

/// Preamble for the needs-more-information decision (N4). Must return a JSON
/// object matching `{\"needs_more_information\": bool, \"reason\": string}`.
pub const NEEDS_INFO_PREAMBLE: &str = "\
You decide whether answering a query requires retrieving external information, \
or whether it can be answered directly from general knowledge and conversation \
context alone (e.g. greetings, arithmetic, requests to summarize text already \
given to you). Respond with ONLY a JSON object of the form \
{\"needs_more_information\": true|false, \"reason\": \"<one sentence>\"}. No \
other text.
";

/// Preamble for the source-selection decision (N5). Must return exactly one
/// of the three tags, nothing else.
pub const CHOOSE_SOURCE_PREAMBLE: &str = "\
You choose exactly one retrieval source for a query: \"knowledge_store\" for \
questions answerable from a curated internal knowledge base, \"web\" for \
questions needing current or general-internet information, or \"tool_api\" \
for questions requiring a live computation or external service call. Respond \
with ONLY the tag — lowercase, no quotes, no punctuation, no explanation.
";

/// Preamble for answer generation (N9). Grounds the answer in the supplied
/// context items; must not fabricate claims the context does not support.
pub const ANSWER_PREAMBLE: &str = "\
You answer questions using ONLY the evidence provided in the context section \
of the prompt. Cite evidence by its source id in square brackets, e.g. [doc-3]. \
If the context does not contain enough information to answer confidently, say \
so plainly rather than guessing. Be concise and direct.
";

/// Preamble for grading (N10). Must return a JSON object with the four axis
/// scores in [0.0, 1.0] plus a short improvement reason.
pub const GRADE_PREAMBLE: &str = "\
You grade a generated answer against the query and the context it was given. \
Score four axes independently, each a float in [0.0, 1.0]: \"relevancy\" (does \
the answer address the query), \"faithfulness\" (is every claim supported by \
the context), \"context_quality\" (did the context actually contain what was \
needed), and \"coherence\" (is the answer well-formed and readable). Respond \
with ONLY a JSON object: {\"relevancy\": f, \"faithfulness\": f, \
\"context_quality\": f, \"coherence\": f, \"improvement_reason\": \"<one \
sentence naming the weakest axis and why>\"}. No other text.
";
