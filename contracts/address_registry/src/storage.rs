use soroban_sdk::{contracttype, Symbol};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Owner,
    Entry(Symbol),
    Initialized,
}
