pub mod game_card;
