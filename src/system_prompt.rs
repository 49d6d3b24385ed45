//! Prompts and fixed player messages for both game modes

use crate::game::GameMode;

/// System prompt when the AI is the guesser
const AI_GUESSER_PROMPT: &str = r#"You are playing 20 Questions. The user is thinking of an object, and you need to guess it by asking up to 20 yes/no questions.

Rules:
- Ask only YES/NO questions
- You have maximum 20 questions
- Make strategic questions that eliminate possibilities
- After receiving answers, think logically about what the object could be
- When you're confident (or on question 20), make your final guess by saying "Is it [object]?"
- Be concise and clear in your questions"#;

/// System prompt when the player is the guesser
const USER_GUESSER_PROMPT: &str = r#"You are playing 20 Questions. You are thinking of a specific object, and the user will ask you up to 20 yes/no questions to guess it.

Rules:
- Pick a random, common object (household item, animal, food, vehicle, etc.)
- Answer ONLY with "Yes", "No", or "Maybe/Sometimes" (for ambiguous questions)
- Be consistent with your answers
- Keep track of the question count
- After 20 questions, reveal the object if not guessed
- If the user guesses correctly, confirm it enthusiastically

Pick an object now and remember it throughout the conversation. Don't reveal it until the user guesses or reaches 20 questions."#;

const AI_GUESSER_OPENING: &str = "I am thinking of an object. You can ask me up to 20 yes/no questions to guess what it is. Start by asking your first question.";

const USER_GUESSER_OPENING: &str = "I want to play 20 questions. Think of an object, and I will ask you yes/no questions to guess it. Let me know when you're ready and have thought of something.";

/// Appended to the outgoing copy of the last allowed question
pub const LAST_QUESTION_MARKER: &str = "\n\n(This is question 20 - my last question!)";

pub const GIVE_UP_MESSAGE: &str = "I give up! Please reveal what object you were thinking of.";

pub const QUESTION_LIMIT_NOTICE: &str =
    "You've reached 20 questions! Make your final guess or ask the AI to reveal the object.";

pub fn system_prompt(mode: GameMode) -> &'static str {
    match mode {
        GameMode::AiGuesser => AI_GUESSER_PROMPT,
        GameMode::UserGuesser => USER_GUESSER_PROMPT,
    }
}

/// First player message of a game
pub fn opening_message(mode: GameMode) -> &'static str {
    match mode {
        GameMode::AiGuesser => AI_GUESSER_OPENING,
        GameMode::UserGuesser => USER_GUESSER_OPENING,
    }
}

pub fn final_guess_message(guess: &str) -> String {
    format!("Is it {guess}? Please tell me if I guessed correctly and reveal what the object was.")
}
