//! Fixed bot texts: greetings, question banks, and closing lines.

use combot_types::{Brand, ChatLogEntry, EndpointType, Level, ProblemType};
use rand::seq::SliceRandom;
use rand::Rng;

pub const LLM_ERROR_REPLY: &str = "An error occurred while generating the response. Please try again.";

/// Reply for indices with nothing to say
pub const BLANK_REPLY: &str = " ";

const BASIC_A: &[&str] = &[
    "Can you describe the problem in more detail?",
    "When did you first notice the issue?",
    "Have you tried to resolve the problem on your own?",
    "Have you used the product as intended and followed any instructions provided?",
    "Is there a specific resolution or solution you are hoping for?",
];

const BASIC_B: &[&str] = &[
    "What was the expected delivery date?",
    "Have you received any updates or notifications regarding your delivery?",
    "Have you tried reaching out to the carrier or delivery service?",
    "Would you like to receive a refund or store credit for the inconvenience?",
    "Are you still hoping to receive the order or would you like to cancel it?",
];

const BASIC_C: &[&str] = &[
    "Can you provide us with more details about the interaction with the employee?",
    "When and where did the interaction take place?",
    "Was there a specific instance or series of incidents that led to you feeling mistreated?",
    "How did the employee behave in a rude or disrespectful manner?",
];

const LULU_A: &[&str] = &[
    "Could you outline the problem with more precision?",
    "When exactly did you first come across the issue?",
    "Have you attempted any specific steps to rectify this problem yourself?",
    "Have you strictly adhered to the guidelines and used the product as directed?",
    "What specific outcome are you seeking to resolve this issue?",
];

const LULU_B: &[&str] = &[
    "Can you confirm the expected delivery date for your order?",
    "Have you been notified of any updates about your delivery status?",
    "Have you already contacted the carrier or delivery service to inquire about your package?",
    "Would you prefer a refund or store credit for this inconvenience?",
    "Do you wish to continue waiting for your order, or would you rather cancel it at this point?",
];

const LULU_C: &[&str] = &[
    "Could you provide us with a detailed account of your interaction with the employee?",
    "When and where exactly did this interaction occur?",
    "Can you identify a specific incident or a sequence of events that contributed to your feeling mistreated?",
    "In what ways did the employee's behavior come across as rude or disrespectful?",
];

/// Canned follow-up questions for a brand and complaint category.
/// Off-topic complaints have no bank.
pub fn question_bank(brand: Brand, problem_type: ProblemType) -> &'static [&'static str] {
    match (brand, problem_type) {
        (Brand::Basic, ProblemType::A) => BASIC_A,
        (Brand::Basic, ProblemType::B) => BASIC_B,
        (Brand::Basic, ProblemType::C) => BASIC_C,
        (Brand::Lulu, ProblemType::A) => LULU_A,
        (Brand::Lulu, ProblemType::B) => LULU_B,
        (Brand::Lulu, ProblemType::C) => LULU_C,
        (_, ProblemType::Other) => &[],
    }
}

pub fn random_question<R: Rng + ?Sized>(brand: Brand, problem_type: ProblemType, rng: &mut R) -> Option<&'static str> {
    question_bank(brand, problem_type).choose(rng).copied()
}

/// A random question from the bank that the bot has not asked yet
pub fn next_question<R: Rng + ?Sized>(
    brand: Brand,
    problem_type: ProblemType,
    chat_log: &[ChatLogEntry],
    rng: &mut R,
) -> Option<&'static str> {
    let asked: Vec<&str> = chat_log
        .iter()
        .filter(|entry| entry.is_bot())
        .map(|entry| entry.text.as_str())
        .collect();

    let remaining: Vec<&'static str> = question_bank(brand, problem_type)
        .iter()
        .copied()
        .filter(|question| !asked.contains(question))
        .collect();

    remaining.choose(rng).copied()
}

pub fn initial_message(brand: Brand, think: Level) -> &'static str {
    match (brand, think) {
        (Brand::Basic, Level::High) => concat!(
            "Hi there! I'm Combot, and it's great to meet you. I'm here to help with any product or ",
            "service problems you may have encountered in the past few months. This could include issues like ",
            "a defective product, a delayed package, or a rude employee. My goal is to provide you with the best ",
            "guidance to resolve your issue. Please start by recounting your bad experiences with as many ",
            "details as possible (when, how, and what happened). ",
            "While I specialize in handling these issues, I am not Alexa or Siri. ",
            "Let's work together to resolve your problem!"
        ),
        (Brand::Basic, Level::Low) => concat!(
            "The purpose of Combot is to assist you with any product or service problems you have ",
            "experienced in the past few months. Examples of issues include defective products, delayed packages, or ",
            "rude frontline employees. Combot is designed to provide optimal guideance to resolve your issue. ",
            "Please provide a detailed account of your negative experiences, including when, how, and what occured. ",
            "Note that Combot specializes in handling product or service issues and is not a general-purpose ",
            "assistant like Alexa or Siri. Let us proceed to resolve your problem."
        ),
        (Brand::Lulu, Level::High) => concat!(
            "Hi there! I'm Combot, and it's great to meet you. I'm here to help with any product or ",
            "service problems you may have encountered in the past few months. My goal is to make sure you receive ",
            "the best guidance from me. Let's work together to resolve your issue!"
        ),
        (Brand::Lulu, Level::Low) => concat!(
            "The purpose of Combot is to assist with resolution of product/service problems. ",
            "If you have experienced any issues in the past few months, Combot is designed to guide you through ",
            "finding the optimal solution."
        ),
    }
}

pub fn closing_message(endpoint: EndpointType) -> &'static str {
    match endpoint {
        EndpointType::General => concat!(
            "THANK YOU for sharing your experience with me! I will send you a set of comprehensive ",
            "suggestions via email. Please provide your email below..."
        ),
        EndpointType::Lulu => concat!(
            "THANK YOU for sharing your experience with me! I will send you a set of comprehensive ",
            "suggestions via email. Please provide your email address below..."
        ),
    }
}

/// Statement sent once the follow-up questions are done, with its message type
pub fn understanding_statement(brand: Brand, feel: Level) -> (&'static str, String) {
    match brand {
        Brand::Basic => {
            let text = match feel {
                Level::High => "I understand how frustrating this must be for you. That's definitely not what we expect.",
                Level::Low => "",
            };
            (text, feel.to_string())
        }
        Brand::Lulu => (
            concat!(
                "I understand your situation and I want to help you resolve this issue. ",
                "I have gathered all the necessary information to provide you with the best possible solution. ",
                "Let me work on finding the most appropriate resolution for your case."
            ),
            "Understanding".to_string(),
        ),
    }
}

/// Reply after the conversation has been saved
pub fn thank_you_message(brand: Brand) -> &'static str {
    match brand {
        Brand::Basic => concat!(
            "Thank you for providing your email! <br><br> As part of this study, please follow this link to ",
            "answer a few follow-up questions: ",
            "<a href='https://mylmu.co1.qualtrics.com/jfe/form/SV_3kjGfxyBTpEL2pE' target='_blank' ",
            "rel='noopener noreferrer'>Survey Link</a>."
        ),
        Brand::Lulu => concat!(
            "Thank you for sharing your experience with me! I will send you a set of comprehensive ",
            "suggestions via email. Please provide your email below..."
        ),
    }
}
