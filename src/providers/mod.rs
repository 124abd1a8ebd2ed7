mod sirena;

pub use sirena::SirenaProvider;
