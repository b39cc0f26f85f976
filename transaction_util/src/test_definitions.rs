#![cfg(test)]

use crate::address::AddressPrefixes;

pub const TEST_COIN: AddressPrefixes = AddressPrefixes {
    standard: 0x0014_5023,   // UNP
    subaddress: 0x0021_1023, // UNPS
    integrated: 0x0029_1023, // UNPi
};
