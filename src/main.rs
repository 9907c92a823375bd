fn main() {
    gdgate::run();
}
