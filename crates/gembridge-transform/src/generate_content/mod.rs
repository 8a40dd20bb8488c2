pub mod gemini2openai_chat;
