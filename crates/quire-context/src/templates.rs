// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt templates.

use crate::PromptStyle;

pub(crate) fn journal_system(style: &PromptStyle, structured: bool) -> String {
    let mut prompt = format!(
        "You turn a day's loose notes into a personal journal entry. \
         Write in {language}, in a {tone} voice, in the first person. \
         Keep every fact from the notes and do not invent events. \
         Lines marked [image] stand for photos the writer took.",
        language = style.language,
        tone = style.tone,
    );

    if structured {
        prompt.push_str(
            "\n\nRespond with a single JSON object and nothing else. It must have exactly \
             these string fields:\n\
             - \"title\": a short title for the day\n\
             - \"summary\": one sentence summarizing the day\n\
             - \"mood\": one lowercase word for the overall mood\n\
             - \"body\": the journal entry in markdown\n\
             - \"insight\": a brief reflective observation about the day",
        );
    } else {
        prompt.push_str(
            "\n\nRespond with the journal entry only, as markdown, starting with a \
             level-one heading that serves as the title.",
        );
    }
    prompt
}

pub(crate) fn extraction_system(style: &PromptStyle) -> String {
    format!(
        "You extract long-term memories from a person's journal notes. \
         Write values in {language}.\n\n\
         Respond with a single JSON object with three arrays:\n\
         - \"semantic\": durable facts, each {{\"key\": dotted.lowercase.key, \"value\": string, \
         \"confidence\": number between 0 and 1}}\n\
         - \"episodic\": notable events, each {{\"event\": string, \"date\": \"YYYY-MM-DD\", \
         \"emotion\": optional string, \"context\": optional string}}\n\
         - \"procedural\": habits and preferences, each {{\"pattern\": string, \
         \"preference\": string, \"trigger\": optional string}}\n\n\
         Use empty arrays when nothing qualifies. Do not repeat the same item twice.",
        language = style.language,
    )
}
