//! Prompt rendering for generation.

use entag_core::parser::{THINK_CLOSE, THINK_OPEN, wrap_entity};
use entag_core::{EntityLabel, LabeledExample};
use serde::{Deserialize, Serialize};

/// Which prompt layout to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptTemplate {
    /// Task description followed by worked examples for the entity class.
    #[default]
    FewShot,
    /// Task description only.
    ZeroShot,
}

/// A worked example shown to the model before the real input.
#[derive(Debug, Clone, Copy)]
pub struct FewShotExample {
    pub context: &'static str,
    pub reasoning: &'static str,
    pub entities: &'static [&'static str],
}

impl FewShotExample {
    /// The assistant turn in canonical answer form.
    #[must_use]
    pub fn response(&self) -> String {
        format!(
            "{THINK_OPEN} {} {THINK_CLOSE} {}",
            self.reasoning,
            wrap_entity(&self.entities.join(", "))
        )
    }
}

const PERSON_EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        context: "Soccer - Japan get lucky win , China in surprise defeat .",
        reasoning: "\"Soccer\" is a sport. \"Japan\" and \"China\" are countries. \
                    \"win\" and \"defeat\" are events. No individual is named.",
        entities: &[],
    },
    FewShotExample {
        context: "China controlled most of the match until the 78th minute when Uzbek striker \
                  Igor Shkvyrin lobbed the ball over the advancing Chinese keeper .",
        reasoning: "\"China\" is a country and \"Uzbek\" a nationality. \"Igor Shkvyrin\" is a \
                    full name of a striker, so it is a person. \"Chinese keeper\" is a role.",
        entities: &["Igor Shkvyrin"],
    },
];

const LOCATION_EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        context: "Japan began the defence of their Asian Cup title with a lucky 2-1 win \
                  against Syria in a Group C championship match on Friday .",
        reasoning: "\"Japan\" and \"Syria\" are countries, which are geographic and political \
                    locations. \"Asian Cup\" is a tournament and \"Group C\" a tournament group.",
        entities: &["Japan", "Syria"],
    },
    FewShotExample {
        context: "Oleg Shatskiku made sure of the win in injury time , hitting an unstoppable \
                  left foot shot from just outside the area .",
        reasoning: "\"Oleg Shatskiku\" is a person. \"the area\" is the penalty area, not a \
                    named place. No location is mentioned.",
        entities: &[],
    },
];

const ORGANIZATION_EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        context: "Japan , co-hosts of the World Cup in 2002 and ranked 20th in the world by \
                  FIFA , are favourites to regain their title here .",
        reasoning: "\"Japan\" alone is a country. \"World Cup\" is an event. \"FIFA\" is the \
                    governing body of football, an organization.",
        entities: &["FIFA"],
    },
    FewShotExample {
        context: "Soccer - Japan get lucky win , China in surprise defeat .",
        reasoning: "\"Japan\" and \"China\" name national teams but on their own are \
                    countries. Nothing else refers to an organization.",
        entities: &[],
    },
];

const MISCELLANEOUS_EXAMPLES: &[FewShotExample] = &[
    FewShotExample {
        context: "Japan began the defence of their Asian Cup title with a lucky 2-1 win \
                  against Syria in a Group C championship match on Friday .",
        reasoning: "\"Japan\" and \"Syria\" are countries. \"Asian Cup\" is a football \
                    tournament, an event. \"Friday\" is a day of the week.",
        entities: &["Asian Cup"],
    },
    FewShotExample {
        context: "Alpine SKIING-OFFICIALS hope to salvage world cup weekend .",
        reasoning: "\"OFFICIALS\" are people. \"world cup\" is a sporting event. \"weekend\" is \
                    a time reference.",
        entities: &["world cup"],
    },
    FewShotExample {
        context: "Soccer - Japan get lucky win , China in surprise defeat .",
        reasoning: "\"Soccer\" is a sport. \"Japan\" and \"China\" are countries. \
                    \"lucky win\" and \"surprise defeat\" are descriptive phrases, not \
                    named events.",
        entities: &[],
    },
];

/// Worked examples for one entity class.
#[must_use]
pub fn few_shot_examples(label: EntityLabel) -> &'static [FewShotExample] {
    match label {
        EntityLabel::Person => PERSON_EXAMPLES,
        EntityLabel::Location => LOCATION_EXAMPLES,
        EntityLabel::Organization => ORGANIZATION_EXAMPLES,
        EntityLabel::Miscellaneous => MISCELLANEOUS_EXAMPLES,
    }
}

fn render_examples(label: EntityLabel) -> String {
    few_shot_examples(label)
        .iter()
        .enumerate()
        .map(|(i, example)| {
            format!(
                "Example {}:\nUser: {}\nAssistant:\n{}\n",
                i + 1,
                example.context,
                example.response()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the user prompt for one example.
#[must_use]
pub fn render_prompt(example: &LabeledExample, template: PromptTemplate) -> String {
    let label = example.entity;
    let mut prompt = format!(
        "A conversation between User and Assistant. The User provides a string of words. \
         The Assistant identifies all the {label} entities in the string and returns them \
         surrounded by an entity tag.\n\
         DESCRIPTION: {query}\n\n\
         The Assistant reasons about the entity class and each word of the string, paying \
         attention to the context.\n\n\
         The reasoning is enclosed within {THINK_OPEN} {THINK_CLOSE} tags and the matching \
         words within {open} {close} tags, i.e. {THINK_OPEN} reasoning here {THINK_CLOSE} \
         {open} comma separated list of {label} entities {close}\n\n\
         If no word matches the entity class, return the entity tag with nothing in between.\n\
         If several words match, separate them with commas inside the entity tag.\n\n",
        query = example.query,
        open = entag_core::parser::ENTITY_OPEN,
        close = entag_core::parser::ENTITY_CLOSE,
    );

    if template == PromptTemplate::FewShot {
        prompt.push_str(&render_examples(label));
        prompt.push('\n');
    }

    prompt.push_str(&format!("User: {}\nAssistant:\n", example.context));
    prompt
}
