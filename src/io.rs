use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use thiserror::Error;

use crate::types::edge::EdgeDB;
use crate::types::{Address, Edge, Int};

#[derive(Debug, Error)]
pub enum EdgeFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("edge file references address index {0} outside the index block")]
    UnknownAddressIndex(u32),
    #[error("magnitude of {0} bytes does not fit the length-prefixed field")]
    OversizedMagnitude(usize),
}

/// Reads an edge set from the binary edge format: a u32-counted block of
/// 20-byte addresses followed by a u32-counted block of edges, each edge
/// being three u32 address indices and a length-prefixed big-endian
/// capacity.
pub fn read_edges_binary(path: &Path) -> Result<EdgeDB, EdgeFileError> {
    let mut file = File::open(path)?;
    let address_index = read_address_index(&mut file)?;
    read_edges(&mut file, &address_index)
}

pub fn write_edges_binary(edges: &EdgeDB, path: &Path) -> Result<(), EdgeFileError> {
    let mut file = File::create(path)?;

    let mut address_index: BTreeMap<Address, u32> = BTreeMap::new();
    for edge in edges.iter() {
        for address in [edge.from, edge.to, edge.token] {
            let next = address_index.len() as u32;
            address_index.entry(address).or_insert(next);
        }
    }
    file.write_all(&(address_index.len() as u32).to_be_bytes())?;
    // BTreeMap iteration is ordered by address, but indices were assigned
    // in first-seen order; emit the block in index order.
    let mut by_index: Vec<(&Address, &u32)> = address_index.iter().collect();
    by_index.sort_by_key(|(_, index)| **index);
    for (address, _) in by_index {
        file.write_all(address.as_bytes())?;
    }

    file.write_all(&(edges.edge_count() as u32).to_be_bytes())?;
    for edge in edges.iter() {
        for address in [&edge.from, &edge.to, &edge.token] {
            file.write_all(&address_index[address].to_be_bytes())?;
        }
        let bytes = edge.capacity.to_bytes_be();
        if bytes.len() > usize::from(u8::MAX) {
            return Err(EdgeFileError::OversizedMagnitude(bytes.len()));
        }
        file.write_all(&[bytes.len() as u8])?;
        file.write_all(&bytes)?;
    }
    Ok(())
}

fn read_address_index(file: &mut File) -> Result<HashMap<u32, Address>, EdgeFileError> {
    let address_count = read_u32(file)?;
    let mut addresses = HashMap::new();
    for i in 0..address_count {
        let mut buf = [0; 20];
        file.read_exact(&mut buf)?;
        addresses.insert(i, Address::from(buf));
    }
    Ok(addresses)
}

fn read_edges(
    file: &mut File,
    address_index: &HashMap<u32, Address>,
) -> Result<EdgeDB, EdgeFileError> {
    let edge_count = read_u32(file)?;
    let mut edges = Vec::with_capacity(edge_count as usize);
    for _ in 0..edge_count {
        let from = read_address(file, address_index)?;
        let to = read_address(file, address_index)?;
        let token = read_address(file, address_index)?;
        let capacity = read_int(file)?;
        edges.push(Edge {
            from,
            to,
            token,
            capacity,
        });
    }
    Ok(EdgeDB::new(edges))
}

fn read_address(
    file: &mut File,
    address_index: &HashMap<u32, Address>,
) -> Result<Address, EdgeFileError> {
    let index = read_u32(file)?;
    address_index
        .get(&index)
        .copied()
        .ok_or(EdgeFileError::UnknownAddressIndex(index))
}

fn read_u32(file: &mut File) -> Result<u32, std::io::Error> {
    let mut buf = [0; 4];
    file.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u8(file: &mut File) -> Result<u8, std::io::Error> {
    let mut buf = [0; 1];
    file.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_int(file: &mut File) -> Result<Int, std::io::Error> {
    let length = read_u8(file)? as usize;
    let mut bytes = vec![0u8; length];
    file.read_exact(&mut bytes)?;
    Ok(Int::from_bytes_be(&bytes))
}
